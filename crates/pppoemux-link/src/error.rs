/// Errors surfaced by link devices.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The device is administratively or operationally down.
    #[error("device {name} is down")]
    DeviceDown { name: String },

    /// The device refused the frame.
    #[error("device {name} rejected frame: {reason}")]
    Rejected { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LinkError>;
