//! apkforge CLI
//!
//! Resolves Android build descriptors into packaging manifests and pinned
//! dependency sets.

use anyhow::Result;
use apkforge_android::{
    gradle, loader, resolve_dependencies, resolve_packaging, validate, Abi, BuildDescriptor,
    DescriptorFormat, PackagingManifest, Pipeline, Resolution, ResolvedDependency, TomlCatalog,
    VersionSource,
};
use apkforge_cli::output::{format_count, format_duration, Status};
use apkforge_core::config::Config;
use apkforge_core::error::{exit_codes, Error};
use apkforge_telemetry::TelemetryConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "apkforge")]
#[command(about = "Resolve Android build descriptors into packaging manifests and pinned dependencies")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Descriptor format: toml, json, gradle (default: from the file extension)
    #[arg(long, global = true)]
    format: Option<DescriptorFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: load, validate, packaging and dependencies
    Resolve {
        /// Build descriptor file
        descriptor: PathBuf,
        /// Version catalog (libs.versions.toml)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a descriptor
    Validate {
        /// Build descriptor file
        descriptor: PathBuf,
    },

    /// Show the packaging manifest
    Packaging {
        /// Build descriptor file
        descriptor: PathBuf,
        /// List assets under this directory that are stored uncompressed
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved dependency set
    Deps {
        /// Build descriptor file
        descriptor: PathBuf,
        /// Version catalog (libs.versions.toml)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a Gradle build file into a TOML descriptor
    Import {
        /// build.gradle or build.gradle.kts
        gradle: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported ABIs
    Abis {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Settings shared by every command
struct Context {
    config: Config,
    format: Option<DescriptorFormat>,
    quiet: bool,
}

impl Context {
    /// Format for a descriptor: `--format`, then the extension, then config
    fn format_for(&self, path: &Path) -> apkforge_core::Result<DescriptorFormat> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        match DescriptorFormat::from_path(path) {
            Some(format) => Ok(format),
            None => self.config.schema.general.default_format.parse(),
        }
    }

    fn load_descriptor(&self, path: &Path) -> apkforge_core::Result<BuildDescriptor> {
        let format = self.format_for(path)?;
        tracing::debug!(path = %path.display(), %format, "Loading descriptor");
        loader::load_file(path, format)
    }

    /// `--catalog` if given, otherwise the configured catalog
    fn catalog(&self, flag: Option<&Path>) -> apkforge_core::Result<Option<TomlCatalog>> {
        let path = match flag {
            Some(path) => Some(path.to_path_buf()),
            None => self.config.catalog_path(),
        };
        path.map(|p| TomlCatalog::load(&p)).transpose()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::failure(&e);
            std::process::exit(e.exit_code());
        }
    };

    apkforge_telemetry::init_with_config(TelemetryConfig {
        log_level: apkforge_telemetry::level_for_verbosity(
            &config.schema.logging.level,
            cli.verbose,
            cli.quiet,
        ),
        ..TelemetryConfig::default()
    })?;

    let ctx = Context {
        config,
        format: cli.format,
        quiet: cli.quiet,
    };

    let exit_code = match cli.command {
        Commands::Resolve { descriptor, catalog, json } => {
            run_resolve(&ctx, &descriptor, catalog.as_deref(), json)
        }
        Commands::Validate { descriptor } => run_validate(&ctx, &descriptor),
        Commands::Packaging { descriptor, assets, json } => {
            run_packaging(&ctx, &descriptor, assets.as_deref(), json)
        }
        Commands::Deps { descriptor, catalog, json } => {
            run_deps(&ctx, &descriptor, catalog.as_deref(), json)
        }
        Commands::Import { gradle, output } => run_import(&ctx, &gradle, output.as_deref()),
        Commands::Abis { json } => run_abis(json),
    };

    std::process::exit(exit_code);
}

/// Report a failure and map it to the process exit code
fn fail(err: Error, json: bool) -> i32 {
    if json {
        if let Ok(report) = serde_json::to_string_pretty(&err.to_report()) {
            println!("{}", report);
        }
    }
    Status::failure(&err);
    err.exit_code()
}

fn print_json(value: &impl serde::Serialize) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            exit_codes::SUCCESS
        }
        Err(e) => fail(e.into(), false),
    }
}

fn resolve(ctx: &Context, path: &Path, catalog: Option<&Path>) -> apkforge_core::Result<Resolution> {
    let descriptor = ctx.load_descriptor(path)?;
    let catalog = ctx.catalog(catalog)?;

    let mut pipeline = Pipeline::new();
    if let Some(catalog) = &catalog {
        pipeline = pipeline.with_catalog(catalog);
    }
    Ok(pipeline.run_descriptor(descriptor)?)
}

fn run_resolve(ctx: &Context, path: &Path, catalog: Option<&Path>, json: bool) -> i32 {
    let start = Instant::now();
    let resolution = match resolve(ctx, path, catalog) {
        Ok(resolution) => resolution,
        Err(e) => return fail(e, json),
    };

    if json {
        return print_json(&resolution);
    }
    if ctx.quiet {
        return exit_codes::SUCCESS;
    }

    print_descriptor(&resolution.descriptor);
    print_manifest(&resolution.manifest);
    print_dependencies(&resolution.dependencies);
    println!();
    Status::success(&format!(
        "Resolved {} and {} in {}",
        format_count(resolution.manifest.abis.len(), "ABI", "ABIs"),
        format_count(resolution.dependencies.len(), "dependency", "dependencies"),
        format_duration(start.elapsed())
    ));
    exit_codes::SUCCESS
}

fn run_validate(ctx: &Context, path: &Path) -> i32 {
    let descriptor = match ctx.load_descriptor(path) {
        Ok(descriptor) => descriptor,
        Err(e) => return fail(e, false),
    };
    match validate(descriptor) {
        Ok(validated) => {
            if !ctx.quiet {
                Status::success(&format!(
                    "{} is valid (minSdk {}, targetSdk {}, compileSdk {})",
                    validated.application_id,
                    validated.sdk.min_sdk,
                    validated.sdk.target_sdk,
                    validated.sdk.compile_sdk
                ));
            }
            exit_codes::SUCCESS
        }
        Err(e) => fail(e.into(), false),
    }
}

fn run_packaging(ctx: &Context, path: &Path, assets: Option<&Path>, json: bool) -> i32 {
    let manifest = match ctx
        .load_descriptor(path)
        .and_then(|d| validate(d).map_err(Error::from))
    {
        Ok(validated) => resolve_packaging(&validated),
        Err(e) => return fail(e, json),
    };

    let asset_names = match assets.map(collect_assets).transpose() {
        Ok(names) => names,
        Err(e) => return fail(e, json),
    };
    let exempt: Option<Vec<&str>> = asset_names
        .as_ref()
        .map(|names| manifest.exempt_assets(names.iter().map(String::as_str)));

    if json {
        return print_json(&serde_json::json!({
            "manifest": manifest,
            "uncompressedAssets": exempt,
        }));
    }
    if ctx.quiet {
        return exit_codes::SUCCESS;
    }

    print_manifest(&manifest);
    if let (Some(dir), Some(exempt)) = (assets, exempt) {
        Status::header(&format!("Uncompressed under {}", dir.display()));
        for asset in &exempt {
            Status::item(asset);
        }
        println!();
        Status::info(&format_count(exempt.len(), "asset stored uncompressed", "assets stored uncompressed"));
    }
    exit_codes::SUCCESS
}

/// Files under `dir`, as sorted `/`-separated paths relative to it
fn collect_assets(dir: &Path) -> apkforge_core::Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::file_not_found(dir));
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::io(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            let name: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            names.push(name.join("/"));
        }
    }
    tracing::debug!(dir = %dir.display(), files = names.len(), "Assets scanned");
    Ok(names)
}

fn run_deps(ctx: &Context, path: &Path, catalog: Option<&Path>, json: bool) -> i32 {
    let resolved = ctx
        .load_descriptor(path)
        .and_then(|d| validate(d).map_err(Error::from))
        .and_then(|validated| {
            let catalog = ctx.catalog(catalog)?;
            let catalog = catalog.as_ref().map(|c| c as &dyn apkforge_android::VersionCatalog);
            Ok(resolve_dependencies(&validated, catalog)?)
        });

    match resolved {
        Ok(deps) if json => print_json(&deps),
        Ok(deps) => {
            if !ctx.quiet {
                print_dependencies(&deps);
            }
            exit_codes::SUCCESS
        }
        Err(e) => fail(e, json),
    }
}

fn run_import(ctx: &Context, path: &Path, output: Option<&Path>) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return fail(Error::file_not_found(path), false)
        }
        Err(e) => return fail(e.into(), false),
    };

    let raw = match gradle::import(&text) {
        Ok(raw) => raw,
        Err(e) => return fail(Error::from(e).with_context(path.display().to_string()), false),
    };
    if let Err(e) = loader::load(&raw) {
        Status::warning(&format!("Imported descriptor is incomplete: {}", e));
    }

    let rendered = match toml::to_string_pretty(&raw) {
        Ok(rendered) => rendered,
        Err(e) => return fail(e.into(), false),
    };

    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, rendered) {
                return fail(e.into(), false);
            }
            if !ctx.quiet {
                Status::success(&format!("Wrote {}", out.display()));
            }
        }
        None => print!("{}", rendered),
    }
    exit_codes::SUCCESS
}

fn run_abis(json: bool) -> i32 {
    if json {
        return print_json(&Abi::ALL);
    }

    Status::header("Supported ABIs");
    for abi in Abi::ALL {
        let width = if abi.is_64_bit() { "64-bit" } else { "32-bit" };
        Status::field(abi.as_str(), &format!("{} ({})", abi.display_name(), width));
    }
    exit_codes::SUCCESS
}

fn print_descriptor(descriptor: &BuildDescriptor) {
    Status::header(&descriptor.application_id);
    Status::field(
        "version",
        &format!("{} ({})", descriptor.version_name, descriptor.version_code),
    );
    Status::field(
        "sdk",
        &format!(
            "min {} / target {} / compile {}",
            descriptor.sdk.min_sdk, descriptor.sdk.target_sdk, descriptor.sdk.compile_sdk
        ),
    );
    if let Some(ndk) = &descriptor.ndk_version {
        Status::field("ndk", ndk);
    }
    if let Some(signing) = descriptor.signing_config() {
        Status::field("release signing", signing);
    }
}

fn print_manifest(manifest: &PackagingManifest) {
    Status::header("Native libraries");
    for dir in manifest.lib_dirs() {
        Status::item(&dir);
    }

    if !manifest.uncompressed.is_empty() {
        Status::header("Stored uncompressed");
        for matcher in &manifest.uncompressed {
            Status::item(matcher.as_str());
        }
    }
}

fn print_dependencies(dependencies: &[ResolvedDependency]) {
    Status::header("Dependencies");
    for dep in dependencies {
        let origin = match &dep.source {
            VersionSource::Explicit => "declared".to_string(),
            VersionSource::Bom { bom } => format!("via {}", bom),
            VersionSource::Catalog => "catalog".to_string(),
        };
        let kind = if dep.platform { "platform, " } else { "" };
        Status::item(&format!("{} ({}{}, {})", dep.notation(), kind, dep.scope, origin));
    }
}
