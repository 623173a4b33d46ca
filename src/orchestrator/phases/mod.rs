//! Orchestrator phases: one module per provisioning stage.
//!
//! - **Stage 1: Input Resolution** (`input`) - image path and device identifier checks
//! - **Stage 2: Destructive Formatter** (`format`) - unmount, erase to FAT32/GPT
//! - **Stage 3: Capacity Verifier** (`capacity`) - free space on the new volume
//! - **Stage 4: Source Mounter** (`mount`) - mount the ISO, discover its path
//! - **Stage 5: Selective Transfer** (`transfer`) - rsync minus the oversized object
//! - **Stage 6: Oversized-Object Splitter** (`split`) - wimlib split into chunks
//! - **Stage 7: Teardown** (`teardown`) - unmount and eject, warnings only
//!
//! Each stage is independently testable against a mock `ToolRunner`.

pub mod capacity;
pub mod format;
pub mod input;
pub mod mount;
pub mod split;
pub mod teardown;
pub mod transfer;

pub use capacity::{available_bytes, check_capacity, source_tree_size};
pub use format::format_target;
pub use input::{expand_home, list_disks, resolve_source_image, resolve_target_device};
pub use mount::mount_image;
pub use split::{find_chunks, split_oversized_object};
pub use teardown::teardown;
pub use transfer::copy_excluding;
