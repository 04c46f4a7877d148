use aqua_resize::{config, output, resize};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aqua-resize")]
#[command(about = "On-demand image resizing for upload directories")]
#[command(long_about = "\
On-demand image resizing for upload directories

Give it the URL of an uploaded image and a target size. It answers with the
URL of an image that satisfies the request:

  - the original, when it already has the requested size
  - a cached copy, when one was produced before
  - a freshly resized copy, written next to the original

Resized copies are named after their source with the size appended:

  uploads/2024/dawn.jpg  →  uploads/2024/dawn-400x300.jpg

Only URLs under the configured upload root are accepted. http, https and
protocol-relative (//host/...) URLs all work, and returned URLs keep the
scheme of the request.

Logging goes to stderr and is controlled with RUST_LOG (default: info).

Run 'aqua-resize gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize an uploaded image and print the resulting URL
    Resize {
        /// URL of the uploaded image
        url: String,
        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Crop to exactly the requested box instead of fitting inside it
        #[arg(long)]
        crop: bool,
        /// Allow a crop to enlarge images smaller than the requested box (no effect without --crop)
        #[arg(long)]
        upscale: bool,
        /// Print URL, width, height and status instead of just the URL
        #[arg(long)]
        tuple: bool,
        /// Print the result as JSON (implies --tuple)
        #[arg(long)]
        json: bool,
    },
    /// Print where the resized copy of an image lives, without resizing
    CachePath {
        /// URL of the uploaded image
        url: String,
        /// Width of the resized copy
        #[arg(long)]
        width: u32,
        /// Height of the resized copy
        #[arg(long)]
        height: u32,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqua_resize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Resize {
            url,
            width,
            height,
            crop,
            upscale,
            tuple,
            json,
        } => {
            let site_config = config::load_config(&cli.config_dir)?;
            let resizer = resize::Resizer::from_config(&site_config);

            let mut request = resize::ResizeRequest::new(url).crop(crop).upscale(upscale);
            request.width = width;
            request.height = height;
            if tuple || json {
                request = request.tuple();
            }

            let result = resizer.process(&request)?;
            match result {
                resize::ResizeOutput::Tuple(full) if json => {
                    println!("{}", output::format_resize_json(&full)?);
                }
                other => output::print_resize_output(&other),
            }
        }
        Command::CachePath { url, width, height } => {
            let site_config = config::load_config(&cli.config_dir)?;
            let resizer = resize::Resizer::from_config(&site_config);
            let location = resizer.cache_location(&url, width, height)?;
            output::print_cache_location(&location);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upscale_is_accepted_without_crop() {
        let cli = Cli::try_parse_from([
            "aqua-resize",
            "resize",
            "http://localhost/uploads/dawn.jpg",
            "--width",
            "400",
            "--upscale",
        ])
        .unwrap();
        match cli.command {
            Command::Resize { crop, upscale, .. } => {
                assert!(!crop);
                assert!(upscale);
            }
            _ => panic!("expected resize command"),
        }
    }
}
