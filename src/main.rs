mod cli;

use mediaseek::config::{self, Config};
use mediaseek::streaming::{copy_range, determine_content_type, ByteRange};
use mediaseek_common::ContainerFormat;
use mediaseek_media::{MediaSegment, SegmentIndex};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Commands::Validate { .. } | Commands::Version => Config::default(),
        _ => config::load_config_or_default(cli.config.as_deref())?,
    };

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise verbose flag, then config
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaseek=trace,mediaseek_media=trace,mediaseek_common=debug".to_string()
        } else {
            config
                .logging
                .filter
                .clone()
                .unwrap_or_else(|| "mediaseek=info,mediaseek_media=warn".to_string())
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Index { file, format, json } => index_file(&file, format, json, &config),
        Commands::Locate {
            file,
            time,
            offset,
            track,
            format,
        } => locate(&file, format, time, offset, track, &config),
        Commands::Extract {
            file,
            time,
            segment,
            track,
            format,
            output,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(extract(
                &file, format, time, segment, track, &output, &config,
            ))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaseek {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_index(
    file: &Path,
    format: Option<ContainerFormat>,
    config: &Config,
) -> Result<SegmentIndex> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let format = match format {
        Some(format) => format,
        None => config.detect_format(file)?,
    };

    tracing::info!("Indexing {:?} as {}", file, format);
    SegmentIndex::open(file, format).with_context(|| format!("Failed to index {:?}", file))
}

fn track_segments(index: &SegmentIndex, track: usize) -> Result<&[MediaSegment]> {
    index.track(track).with_context(|| {
        format!(
            "Track {} out of range ({} track(s) indexed)",
            track,
            index.track_count()
        )
    })
}

fn index_file(
    file: &Path,
    format: Option<ContainerFormat>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let index = open_index(file, format, config)?;

    if json {
        let json_str = serde_json::to_string_pretty(&index)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Container: {}", index.format);
    println!("Size: {} bytes", index.file_size);
    println!("Tracks: {}", index.track_count());

    for (t, segments) in index.tracks.iter().enumerate() {
        println!("\nTrack {}: {} segment(s)", t, segments.len());
        for (i, segment) in segments.iter().enumerate() {
            println!(
                "  [{:>4}] {:>12} +{:<10} {:>10.3}s",
                i, segment.offset, segment.size, segment.timestamp_secs
            );
        }
    }

    Ok(())
}

fn locate(
    file: &Path,
    format: Option<ContainerFormat>,
    time: Option<f64>,
    offset: Option<u64>,
    track: usize,
    config: &Config,
) -> Result<()> {
    let index = open_index(file, format, config)?;
    track_segments(&index, track)?;

    let found = match (time, offset) {
        (Some(secs), _) => index.segment_at_time(track, secs),
        (None, Some(byte)) => index.segment_at_offset(track, byte),
        (None, None) => anyhow::bail!("Either --time or --offset is required"),
    };
    let (i, segment) = found.context("No segment matches")?;
    let range = ByteRange::for_segment(segment, index.file_size)
        .with_context(|| format!("Segment {} is empty", i))?;

    println!("Segment: {}", i);
    println!("Time: {:.3}s", segment.timestamp_secs);
    println!("Offset: {}", segment.offset);
    println!("Size: {}", segment.size);
    println!("Range: {}", range.range_header());
    println!("Content-Range: {}", range.content_range());
    println!(
        "Content-Type: {}",
        determine_content_type(index.format, file.extension().and_then(|e| e.to_str()))
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn extract(
    file: &Path,
    format: Option<ContainerFormat>,
    time: Option<f64>,
    segment: Option<usize>,
    track: usize,
    output: &Path,
    config: &Config,
) -> Result<()> {
    let index = open_index(file, format, config)?;
    let segments = track_segments(&index, track)?;

    let (i, selected) = match (segment, time) {
        (Some(i), _) => segments
            .get(i)
            .map(|s| (i, s))
            .with_context(|| format!("Segment {} out of range ({} segments)", i, segments.len()))?,
        (None, Some(secs)) => index
            .segment_at_time(track, secs)
            .context("Track has no segments")?,
        (None, None) => anyhow::bail!("Either --time or --segment is required"),
    };
    let range = ByteRange::for_segment(selected, index.file_size)
        .with_context(|| format!("Segment {} is empty", i))?;

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping copy");
                cancel.cancel();
            }
        }
    });

    let mut out = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create {:?}", output))?;

    tracing::info!("Copying segment {} ({})", i, range.content_range());
    let result = copy_range(
        file,
        range,
        &mut out,
        config.streaming.chunk_size,
        &cancel,
    )
    .await;
    ctrl_c.abort();
    let written = result.with_context(|| format!("Failed to copy segment {}", i))?;

    if cancel.is_cancelled() {
        anyhow::bail!(
            "Extraction cancelled after {} of {} bytes",
            written,
            range.content_length()
        );
    }

    println!(
        "Wrote segment {} ({} bytes, {:.3}s) to {}",
        i,
        written,
        selected.timestamp_secs,
        output.display()
    );

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Chunk size: {} bytes", config.streaming.chunk_size);
    println!(
        "  Log filter: {}",
        config.logging.filter.as_deref().unwrap_or("(default)")
    );
    println!("  MP4 extensions: {}", config.formats.mp4_extensions.join(", "));
    println!(
        "  Matroska extensions: {}",
        config.formats.matroska_extensions.join(", ")
    );

    Ok(())
}
