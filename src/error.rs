use anyhow::anyhow;

pub type Result<T> = std::result::Result<T, LibError>;

/// Classification of a failed tree operation.
///
/// Every kind is a synchronous input/state-validation failure; nothing here is
/// transient or retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateNode,
    NodeNotFound,
    EdgeNotFound,
    SelfLoop,
    ImportValidation,
    InvalidInput,
    NotFound,
    Unauthorized,
    Unknown,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn duplicate_node(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::DuplicateNode,
            code: "duplicate_node",
            public,
            source,
        }
    }

    pub fn node_not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NodeNotFound,
            code: "node_not_found",
            public,
            source,
        }
    }

    pub fn edge_not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::EdgeNotFound,
            code: "edge_not_found",
            public,
            source,
        }
    }

    pub fn self_loop(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::SelfLoop,
            code: "self_loop",
            public,
            source,
        }
    }

    pub fn import_validation(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::ImportValidation,
            code: "import_validation",
            public,
            source,
        }
    }

    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            source,
        }
    }

    pub fn invalid_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            source,
        }
    }

    pub fn unauthorized(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            code: "unauthorized",
            public,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            source,
        }
    }

    pub fn message(public: &'static str) -> Self {
        Self::unknown(public, anyhow!(public))
    }
}
