use bhumi_proto::{DeviceId, Status};

/// Why a locally-originated register or update was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("no space for another tracked device")]
    CapacityExhausted,
    #[error("access level {requested} may not overwrite a registration made at level {existing}")]
    AccessDenied { existing: u8, requested: u8 },
    #[error("token already registered to device {owner}")]
    TokenConflict { owner: DeviceId },
}

impl TrackerError {
    /// Status code reported back to the command issuer
    pub fn status(&self) -> Status {
        match self {
            TrackerError::CapacityExhausted => Status::NoSpace,
            TrackerError::AccessDenied { .. } => Status::NoAccess,
            TrackerError::TokenConflict { .. } => Status::AlreadyExists,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(TrackerError::CapacityExhausted.status(), Status::NoSpace);
        assert_eq!(
            TrackerError::AccessDenied { existing: 0, requested: 2 }.status(),
            Status::NoAccess
        );
        assert_eq!(
            TrackerError::TokenConflict { owner: 3 }.status(),
            Status::AlreadyExists
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            TrackerError::TokenConflict { owner: 12 }.to_string(),
            "token already registered to device 12"
        );
    }
}
