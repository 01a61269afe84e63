pub mod algora;
pub mod polar;
pub mod poller;

pub use algora::AlgoraClient;
pub use polar::PolarClient;
pub use poller::PlatformPoller;
