use modres_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ResolveError
pub type Result<T> = std::result::Result<T, ResolveError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// handling, log filtering and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Descriptor
    Parse,

    // Registry
    RegistryLookup,
    DescriptorNotFound,
    Io,

    // Root descriptor / configuration
    DuplicateOverride,
    ConflictingOverrideKind,
    Configuration,

    // Selection
    VersionResolution,
    CompatibilityLevel,
    DirectDependencyMismatch,

    // Evaluation
    Interrupted,
    Internal,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "ERR_PARSE",
            ErrorKind::RegistryLookup => "ERR_REGISTRY_LOOKUP",
            ErrorKind::DescriptorNotFound => "ERR_DESCRIPTOR_NOT_FOUND",
            ErrorKind::Io => "ERR_IO",
            ErrorKind::DuplicateOverride => "ERR_DUPLICATE_OVERRIDE",
            ErrorKind::ConflictingOverrideKind => "ERR_CONFLICTING_OVERRIDE_KIND",
            ErrorKind::Configuration => "ERR_CONFIGURATION",
            ErrorKind::VersionResolution => "ERR_VERSION_RESOLUTION",
            ErrorKind::CompatibilityLevel => "ERR_COMPATIBILITY_LEVEL",
            ErrorKind::DirectDependencyMismatch => "ERR_DIRECT_DEPENDENCY_MISMATCH",
            ErrorKind::Interrupted => "ERR_INTERRUPTED",
            ErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Comprehensive error taxonomy for resolution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    // ===== Descriptor Errors =====
    /// Descriptor text could not be parsed, or does not describe the module
    /// it was fetched for
    #[error("Failed to parse descriptor for {origin}: {message}")]
    Parse { origin: String, message: String },

    // ===== Registry Errors =====
    /// No configured registry knows the module name
    #[error("Module {module} not found in any registry (tried: {registries:?})")]
    RegistryLookup {
        module: String,
        registries: Vec<String>,
    },

    /// A registry knows the module, but not the requested version
    #[error("Module {module} has no version {version} in registries {registries:?}")]
    DescriptorNotFound {
        module: String,
        version: String,
        registries: Vec<String>,
    },

    /// A registry could not be read
    #[error("Registry {registry} failed: {message}")]
    Registry {
        registry: String,
        message: String,
        /// Whether retrying the same fetch later may succeed
        transient: bool,
    },

    // ===== Root Descriptor Errors =====
    /// The same module name carries two overrides of the same style
    #[error("Module {module} has more than one override")]
    DuplicateOverride { module: String },

    /// The same module name carries a path-style and a version-style override
    #[error("Module {module} has conflicting overrides: {first} and {second}")]
    ConflictingOverrideKind {
        module: String,
        first: String,
        second: String,
    },

    /// Malformed configuration or override attribute
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    // ===== Selection Errors =====
    /// A multiple-version override cannot satisfy a requested version
    #[error("Version {version} of module {module} is not allowed by multiple-version override {allowed:?}")]
    VersionResolution {
        module: String,
        version: String,
        allowed: Vec<String>,
    },

    /// The selected version changes the compatibility level seen by a dependent
    #[error("Module {module}@{requested} (compatibility level {requested_level}) requested by {requested_by} was upgraded to {selected} (compatibility level {selected_level})")]
    CompatibilityLevel {
        module: String,
        requested: String,
        requested_level: u32,
        requested_by: String,
        selected: String,
        selected_level: u32,
    },

    /// A direct dependency of the root resolved to a different version
    #[error("Direct dependency {module} is declared at {declared} but resolved to {selected}")]
    DirectDependencyMismatch {
        module: String,
        declared: String,
        selected: String,
    },

    // ===== Evaluation Errors =====
    /// The evaluation was interrupted before it completed
    #[error("Resolution interrupted")]
    Interrupted,

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ResolveError {
    /// Get the canonical kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Parse { .. } => ErrorKind::Parse,
            ResolveError::RegistryLookup { .. } => ErrorKind::RegistryLookup,
            ResolveError::DescriptorNotFound { .. } => ErrorKind::DescriptorNotFound,
            ResolveError::Registry { .. } => ErrorKind::Io,
            ResolveError::DuplicateOverride { .. } => ErrorKind::DuplicateOverride,
            ResolveError::ConflictingOverrideKind { .. } => ErrorKind::ConflictingOverrideKind,
            ResolveError::Configuration { .. } => ErrorKind::Configuration,
            ResolveError::VersionResolution { .. } => ErrorKind::VersionResolution,
            ResolveError::CompatibilityLevel { .. } => ErrorKind::CompatibilityLevel,
            ResolveError::DirectDependencyMismatch { .. } => ErrorKind::DirectDependencyMismatch,
            ResolveError::Interrupted => ErrorKind::Interrupted,
            ResolveError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the substrate may retry the failed request later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolveError::Registry {
                transient: true,
                ..
            }
        )
    }

    /// The module name this error is about, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            ResolveError::RegistryLookup { module, .. }
            | ResolveError::DescriptorNotFound { module, .. }
            | ResolveError::DuplicateOverride { module }
            | ResolveError::ConflictingOverrideKind { module, .. }
            | ResolveError::VersionResolution { module, .. }
            | ResolveError::CompatibilityLevel { module, .. }
            | ResolveError::DirectDependencyMismatch { module, .. } => Some(module),
            _ => None,
        }
    }

    pub(crate) fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ResolveError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        ResolveError::Internal {
            message: message.into(),
        }
    }
}

/// Structured error report
///
/// Flattened view of a [`ResolveError`] with classification fields for
/// structured logs and external tooling.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    kind: ErrorKind,
    op: Option<String>,
    module: Option<String>,
    canonical_name: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ErrorReport {
    /// Create a new report with the specified kind
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            op: None,
            module: None,
            canonical_name: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add module context
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Add canonical repository name context
    pub fn with_canonical_name(mut self, name: impl Into<String>) -> Self {
        self.canonical_name = Some(name.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn canonical_name(&self) -> Option<&str> {
        self.canonical_name.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(module) = &self.module {
            write!(f, " (module: {})", module)?;
        }
        if let Some(name) = &self.canonical_name {
            write!(f, " (canonical_name: {})", name)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

// ========== End Error Facility ==========

impl From<&ResolveError> for ErrorReport {
    fn from(err: &ResolveError) -> Self {
        let report = ErrorReport::new(err.kind()).with_message(err.to_string());
        match err.module() {
            Some(module) => report.with_module(module),
            None => report,
        }
    }
}

impl From<ResolveError> for ErrorReport {
    fn from(err: ResolveError) -> Self {
        ErrorReport::from(&err)
    }
}
