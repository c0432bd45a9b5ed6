#![forbid(unsafe_code)]
//! Command-line interface for enc_dir.
//!
//! Passphrase acquisition (interactive prompt or `--password-file`) and path
//! selection live here; the library does the actual packaging and crypto.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use enc_dir::{BackupOptions, KdfParams, backup, restore};
use secrecy::SecretString;

#[derive(Parser, Debug)]
#[command(
    name = "enc-dir",
    version,
    about = "Back up a directory into an encrypted container file and restore it"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a directory into a container file
    Backup(BackupArgs),
    /// Decrypt a container file into a directory
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
struct BackupArgs {
    /// Directory to back up
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Output container file. If omitted, ".edir" is appended.
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// scrypt cost: log2 of the iteration count N
    #[arg(long, default_value_t = KdfParams::default().log_n)]
    log_n: u8,

    /// Read password from file instead of interactive prompt
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RestoreArgs {
    /// Input container file
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Destination directory (created if missing)
    #[arg(short = 'd', long = "dest")]
    dest: PathBuf,

    /// scrypt cost used at backup time: log2 of the iteration count N
    #[arg(long, default_value_t = KdfParams::default().log_n)]
    log_n: u8,

    /// Read password from file instead of interactive prompt
    #[arg(short = 'p', long = "password-file")]
    password_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Backup(a) => cmd_backup(a),
        Command::Restore(a) => cmd_restore(a),
    }
}

fn read_password(password_file: &Option<PathBuf>, prompt: &str) -> Result<SecretString> {
    if let Some(path) = password_file {
        let mut s = String::new();
        fs::File::open(path)?.read_to_string(&mut s)?;

        // Create SecretString directly from the trimmed slice, then zero the
        // original buffer that held the password.
        let secret = SecretString::new(
            s.trim_end_matches(&['\r', '\n'][..])
                .to_owned()
                .into_boxed_str(),
        );
        use zeroize::Zeroize;
        s.zeroize();
        Ok(secret)
    } else {
        let pw = rpassword::prompt_password(prompt)?;
        Ok(SecretString::new(pw.into_boxed_str()))
    }
}

fn opts_with(log_n: u8, force: bool) -> BackupOptions {
    BackupOptions {
        kdf_params: KdfParams {
            log_n,
            ..Default::default()
        },
        force,
    }
}

fn cmd_backup(a: BackupArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;
    let opts = opts_with(a.log_n, a.force);

    let out = backup(&a.input, a.output.as_deref(), &pw, &opts)
        .with_context(|| "backup failed")?;

    eprintln!("Wrote {}", out.display());
    Ok(())
}

fn cmd_restore(a: RestoreArgs) -> Result<()> {
    let pw = read_password(&a.password_file, "Password: ")?;
    let opts = opts_with(a.log_n, false);

    restore(&a.input, &a.dest, &pw, &opts).with_context(|| "restore failed")?;

    eprintln!("Restored to {}", a.dest.display());
    Ok(())
}
