use std::env;
use std::path::PathBuf;

use anyhow::Context;
use harmonium::{
    encode_pcm16, load_path, render_score, write_wav, Meter, RenderConfig, VoicePreset,
};

fn print_usage() {
    eprintln!(
        "Usage:\n  harmonium [options] <input>\n\nInput is a standard MIDI file or a text notation file.\n\nOptions:\n  -o, --output <file>     Output WAV path (default: out.wav)\n  --bpm <n>               Notation tempo in beats per minute (default: 100)\n  --force-bpm <n>         Override every tempo in a MIDI stream\n  --preset <name>         Voice preset for notation input (default: default)\n  --transpose <n>         Shift notation pitches by n semitones\n  --meter <num/den>       Time signature for bar validation (default: 4/4)\n  --gain <n>              Peak level after normalization, 0..1 (default: 0.85)\n  --sample-rate <n>       Output sample rate in Hz (default: 44100)\n  --config <file>         Load settings from a JSON file first\n  --no-validate           Skip bar-length validation of notation input\n  -h, --help              Show this help\n\nPresets: {}\n",
        VoicePreset::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    let value = value.with_context(|| format!("{flag} requires an argument"))?;
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid value for {flag}: {e}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = RenderConfig::default();
    let mut input: Option<PathBuf> = None;
    let mut output = PathBuf::from("out.wav");
    let mut show_help = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => show_help = true,
            "--no-validate" => config.validate = false,
            "--output" | "-o" => {
                output = PathBuf::from(parse_value::<String>("--output", args.next())?);
            }
            "--bpm" => config.bpm = parse_value("--bpm", args.next())?,
            "--force-bpm" => {
                config.tempo_override_bpm = Some(parse_value("--force-bpm", args.next())?);
            }
            "--preset" => {
                config.preset = parse_value::<VoicePreset>("--preset", args.next())?;
            }
            "--transpose" => config.transpose = parse_value("--transpose", args.next())?,
            "--meter" => config.meter = parse_value::<Meter>("--meter", args.next())?,
            "--gain" => config.gain = parse_value("--gain", args.next())?,
            "--sample-rate" => config.sample_rate = parse_value("--sample-rate", args.next())?,
            "--config" => {
                let path: String = parse_value("--config", args.next())?;
                config = RenderConfig::from_json_file(path.as_ref())
                    .with_context(|| format!("failed to load config '{path}'"))?;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown flag: {arg}");
                show_help = true;
            }
            _ => input = Some(PathBuf::from(arg)),
        }
    }

    if show_help || input.is_none() {
        print_usage();
        return Ok(());
    }
    let input = input.unwrap_or_default();
    let config = config.checked().context("invalid settings")?;

    let score = load_path(&input, &config)
        .with_context(|| format!("failed to load '{}'", input.display()))?;
    println!(
        "Loaded {} track(s), {} note(s), {:.1} s",
        score.tracks.len(),
        score.note_count(),
        score.duration()
    );

    let master = render_score(&score, &config)?;
    let pcm = encode_pcm16(&master, config.gain);
    write_wav(&output, &pcm, config.sample_rate)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}
