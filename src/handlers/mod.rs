//! Entry points for the signals a gateway produces: connect, disconnect and
//! message. Both the built-in WebSocket gateway and the HTTP signal route
//! call through here.

pub mod intake;
pub mod lifecycle;

pub use intake::IntakeHandler;
pub use lifecycle::LifecycleHandler;
