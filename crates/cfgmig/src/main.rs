use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cfgmig::{
    BackupManager, ConfigSchema, ConfigStore, MergeStrategy, MigrationManager, MigrationSettings,
    MissingStepPolicy,
};
use cfgmig_core::read_version_field;
use cfgmig_tree::ConfigPath;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let file = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };
    let backup_dir = Arg::new("backup-dir")
        .long("backup-dir")
        .value_parser(value_parser!(PathBuf))
        .help("Directory for backups (default: backups/ next to the file)");
    let field = Arg::new("field")
        .long("field")
        .default_value("version")
        .help("Dotted path of the version field");

    Command::new("cfgmig")
        .version(cfgmig::VERSION)
        .about("Inspect, migrate and back up versioned configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with migration settings"),
        )
        .subcommand(
            Command::new("version")
                .about("Print the version declared by a configuration file")
                .arg(file("file", "Configuration file"))
                .arg(field.clone()),
        )
        .subcommand(
            Command::new("migrate")
                .about("Stamp a file with a new version and merge it with defaults")
                .arg(file("file", "Configuration file to migrate"))
                .arg(
                    Arg::new("defaults")
                        .long("defaults")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the default configuration"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .help("Version to migrate to"),
                )
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .help("override, merge-missing-only or version-only"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .default_value("skip")
                        .help("Missing step policy: fail or skip"),
                )
                .arg(
                    Arg::new("header")
                        .long("header")
                        .help("Header comment written at the top of the file"),
                )
                .arg(backup_dir.clone())
                .arg(field),
        )
        .subcommand(
            Command::new("backup")
                .about("Copy a file into the backup directory")
                .arg(file("file", "File to back up"))
                .arg(
                    Arg::new("label")
                        .long("label")
                        .required(true)
                        .help("Version label embedded in the backup name"),
                )
                .arg(backup_dir),
        )
        .subcommand(
            Command::new("restore")
                .about("Copy a backup back over its original file")
                .arg(file("backup", "Backup file"))
                .arg(file("file", "File to overwrite")),
        )
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(matches: &ArgMatches) -> Result<MigrationSettings> {
    match matches.get_one::<PathBuf>("settings") {
        Some(path) => MigrationSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(MigrationSettings::default()),
    }
}

fn required<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, name: &str) -> Result<&'a T> {
    args.get_one::<T>(name)
        .with_context(|| format!("missing argument --{name}"))
}

fn version_path(args: &ArgMatches) -> Result<ConfigPath> {
    let field = required::<String>(args, "field")?;
    ConfigPath::parse(field).with_context(|| format!("invalid version field '{field}'"))
}

fn config_type_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("config")
        .to_string()
}

fn run_version(args: &ArgMatches) -> Result<()> {
    let file = required::<PathBuf>(args, "file")?;
    let store = ConfigStore::default();
    let tree = store.load_tree(file)?;
    match read_version_field(tree.tree(), &version_path(args)?)? {
        Some(version) => println!("{version}"),
        None => println!("unversioned"),
    }
    Ok(())
}

fn run_migrate(args: &ArgMatches, settings: MigrationSettings) -> Result<()> {
    let file = required::<PathBuf>(args, "file")?;
    let defaults_file = required::<PathBuf>(args, "defaults")?;
    let target = required::<String>(args, "target")?;

    let strategy = args
        .get_one::<String>("strategy")
        .map(|s| s.parse::<MergeStrategy>())
        .transpose()?;
    let policy: MissingStepPolicy = required::<String>(args, "policy")?.parse()?;
    let mut settings = settings.with_policy(policy);
    if let Some(dir) = args.get_one::<PathBuf>("backup-dir") {
        settings = settings.with_backup_dir(dir);
    }

    let store = ConfigStore::new(MigrationManager::from_settings(&settings));
    let defaults = store
        .load_tree(defaults_file)
        .with_context(|| format!("reading defaults from {}", defaults_file.display()))?;

    let mut schema =
        ConfigSchema::new(config_type_for(file), target.as_str(), defaults).with_version_path(version_path(args)?);
    if let Some(header) = args.get_one::<String>("header") {
        schema = schema.with_header(header);
    }

    if !store.manager().backups().is_enabled() {
        tracing::debug!("Backups disabled by settings");
    }

    let result = store
        .migrate_file(file, &schema, strategy)
        .with_context(|| format!("migrating {}", file.display()))?;

    if !result.was_migrated() {
        match result.old_version() {
            Some(version) => println!("{} already at version {version}", file.display()),
            None => println!("created {} at version {target}", file.display()),
        }
        return Ok(());
    }

    println!(
        "migrated {} from {} to {}",
        file.display(),
        result.old_version().map_or_else(|| "unversioned".to_string(), ToString::to_string),
        target
    );
    if let Some(backup) = result.backup_path() {
        println!("backup: {}", backup.display());
    }
    Ok(())
}

fn run_backup(args: &ArgMatches, settings: &MigrationSettings) -> Result<()> {
    let file = required::<PathBuf>(args, "file")?;
    let label = required::<String>(args, "label")?;
    let backups = match args.get_one::<PathBuf>("backup-dir") {
        Some(dir) => BackupManager::in_directory(dir).with_timestamp_format(settings.backup.timestamp_format.clone()),
        None => BackupManager::from_settings(&settings.backup),
    };

    match backups.backup(file, label)? {
        Some(path) => println!("{}", path.display()),
        None if !backups.is_enabled() => bail!("backups are disabled by settings"),
        None => bail!("{} does not exist", file.display()),
    }
    Ok(())
}

fn run_restore(args: &ArgMatches) -> Result<()> {
    let backup = required::<PathBuf>(args, "backup")?;
    let file = required::<PathBuf>(args, "file")?;
    BackupManager::new()
        .restore(backup, file)
        .with_context(|| format!("restoring {}", file.display()))?;
    println!("restored {} from {}", file.display(), backup.display());
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));
    let settings = load_settings(&matches)?;

    match matches.subcommand() {
        Some(("version", args)) => run_version(args),
        Some(("migrate", args)) => run_migrate(args, settings),
        Some(("backup", args)) => run_backup(args, &settings),
        Some(("restore", args)) => run_restore(args),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}
