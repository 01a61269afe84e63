pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS bounties (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL,
    repository_url TEXT NOT NULL,
    platform TEXT NOT NULL,
    amount_cents INTEGER,
    currency TEXT,
    title TEXT,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'OPEN',
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    failed_at TEXT,
    pull_request_id TEXT,
    failure_reason TEXT
);

CREATE TABLE IF NOT EXISTS cves (
    id TEXT PRIMARY KEY,
    cve_id TEXT NOT NULL UNIQUE,
    description TEXT,
    severity TEXT NOT NULL DEFAULT 'UNKNOWN',
    cvss_score REAL,
    published_at TEXT NOT NULL,
    last_modified_at TEXT,
    affected_languages TEXT,
    affected_products TEXT,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS triage_queue (
    queue TEXT NOT NULL,
    member_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    score REAL NOT NULL,
    enqueued_at TEXT NOT NULL,
    PRIMARY KEY (queue, member_id)
);

CREATE INDEX IF NOT EXISTS idx_bounties_issue_platform ON bounties(issue_id, platform);
CREATE INDEX IF NOT EXISTS idx_bounties_status ON bounties(status);
CREATE INDEX IF NOT EXISTS idx_triage_queue_score ON triage_queue(queue, score);
";
