//! Environment constants and path utilities.
//!
//! Centralizes the well-known paths, file names and label keys shared by the
//! runtime integration, the CLI and the environment file.

use std::path::{Path, PathBuf};

/// Per-context state directory name (hidden directory like .git)
pub const DEVSYNC_DIR_NAME: &str = ".devsync";

/// Default component manifest file name
pub const MANIFEST_FILE_NAME: &str = "devsync.toml";

/// Mount path of the project-source volume inside every managed container
pub const PROJECT_SOURCE_MOUNT: &str = "/projects";

/// Environment file layout within the state directory
pub mod envfile {
    /// Environment directory name within .devsync
    pub const ENV_DIR_NAME: &str = "env";

    /// Environment file name
    pub const ENV_FILE_NAME: &str = "env.toml";
}

/// Label keys and values placed on managed containers and volumes
pub mod labels {
    /// Component name label
    pub const COMPONENT: &str = "component";

    /// Container alias label (the container's name within the component)
    pub const ALIAS: &str = "alias";

    /// Volume type label
    pub const TYPE: &str = "type";

    /// Value of [`TYPE`] for project-source volumes
    pub const PROJECTS_TYPE: &str = "projects";
}

/// Build the state directory path for a context directory
pub fn devsync_dir_path(context: &Path) -> PathBuf {
    context.join(DEVSYNC_DIR_NAME)
}

/// Build the environment file path for a context directory
pub fn env_file_path(context: &Path) -> PathBuf {
    devsync_dir_path(context)
        .join(envfile::ENV_DIR_NAME)
        .join(envfile::ENV_FILE_NAME)
}

/// Build the default manifest path for a context directory
pub fn manifest_file_path(context: &Path) -> PathBuf {
    context.join(MANIFEST_FILE_NAME)
}
