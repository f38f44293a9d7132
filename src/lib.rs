//! Figmint Library
//!
//! Extracts shared styles and export declarations from a Figma document and
//! turns them into downloaded assets plus a generated `styles` module.
//!
//! # Module Overview
//!
//! - [`figma`] - Document model and the [`DesignSource`] seam
//! - [`figma_client`] - Figma REST API client
//! - [`walker`] - Depth-first discovery of styles and export declarations
//! - [`styles`] - Style metadata merge and image-fill download
//! - [`exports`] - Export batching, resolution and the export tree
//! - [`projection`] - Styles grouped by category under camel-cased names
//! - [`codegen`] - `index.js`/`index.ts`, `styles.json` and `colors.scss`
//! - [`changes`] - Change report against the previous snapshot
//! - [`sync`] - One full pass of the pipeline
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use figmint_lib::{run_sync, FigmaAuth, FigmaClient, SyncOptions};
//!
//! # async fn example() -> figmint_lib::Result<()> {
//! let client = FigmaClient::new(FigmaAuth::resolve(None)?)?;
//! let report = run_sync(
//!     &client,
//!     &SyncOptions {
//!         file_key: "FILE_KEY".into(),
//!         output: "figmaStyles".into(),
//!         typescript: true,
//!     },
//! )
//! .await?;
//! println!("{} styles, bump: {:?}", report.styles, report.changes.bump);
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod codegen;
pub mod config;
pub mod error;
pub mod exports;
pub mod figma;
pub mod figma_client;
pub mod names;
pub mod output;
pub mod paths;
pub mod projection;
pub mod styles;
pub mod sync;
pub mod walker;

pub use changes::{ChangeSet, VersionBump};
pub use config::Config;
pub use error::{ErrorCategory, ErrorPayload, FigmintError, Result};
pub use exports::{batch_exports, resolve_exports, DownloadBatch, ExportRecord, ExportTree, Scale};
pub use figma::{DesignSource, FileResponse, Node, NodeKind, OfflineSource};
pub use figma_client::{FigmaAuth, FigmaClient};
pub use output::{FigmintOutput, FIGMINT_OUTPUT_VERSION};
pub use projection::{project, NameCollision, StyleProjection};
pub use styles::{resolve_styles, ResolvedStyle, StyleCategory, StyleDefinition};
pub use sync::{inspect, run_sync, InspectReport, SyncOptions, SyncReport};
pub use walker::{walk, Discovery, ExportDeclaration};
