use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bootconf")]
#[command(version)]
#[command(about = "Edit the boot configuration embedded in firmware images", long_about = None)]
#[command(after_help = "Examples:\n  \
  bootconf show                        print the active configuration\n  \
  bootconf extract release.img         print the configuration inside an image\n  \
  bootconf write -c boot.cfg -i release.img -o patched.img\n  \
  bootconf edit                        edit the configuration and schedule an update")]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the configuration the system booted with
    Show {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the configuration embedded in a firmware image
    Extract {
        /// Firmware image to read
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write a new image with the configuration section replaced
    Write {
        /// New configuration text
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Signature over the configuration, for the digest section
        #[arg(short, long, value_name = "FILE", requires = "pubkey")]
        signature: Option<PathBuf>,

        /// PEM-encoded 2048-bit RSA public key, for the key section
        #[arg(short = 'k', long, value_name = "PEM", requires = "signature")]
        pubkey: Option<PathBuf>,

        /// Base image to start from
        #[arg(short, long, value_name = "IMAGE")]
        image: PathBuf,

        /// Where to write the finished image
        #[arg(short, long, value_name = "IMAGE")]
        output: PathBuf,
    },

    /// Replace the configuration in the latest release image and schedule
    /// the update for next boot
    Apply {
        /// New configuration text
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Edit the configuration in $EDITOR and schedule the update
    Edit,
}
