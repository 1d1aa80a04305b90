pub mod canonical;
pub mod descriptor;
pub mod key;
pub mod repo_spec;

pub use canonical::{canonical_repo_name, split_canonical_name, LiveVersion, OVERRIDE_MARKER};
pub use descriptor::{
    validate_module_name, DepEdge, ModuleDescriptor, OverrideDecl, OverrideStyle, PatchStrip,
};
pub use key::{KeyVersion, ModuleKey};
pub use repo_spec::{AttrValue, RepoSpec, Scalar, LOCAL_REPOSITORY};
