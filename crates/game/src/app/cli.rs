use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CliOptions {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) load_path: Option<PathBuf>,
    pub(crate) save_path: Option<PathBuf>,
    pub(crate) sprites_dir: Option<PathBuf>,
    pub(crate) frames: Option<u32>,
    pub(crate) seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Run(CliOptions),
    Help,
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--config" => options.config_path = Some(PathBuf::from(flag_value(args, index)?)),
            "--load" => options.load_path = Some(PathBuf::from(flag_value(args, index)?)),
            "--save" => options.save_path = Some(PathBuf::from(flag_value(args, index)?)),
            "--sprites" => options.sprites_dir = Some(PathBuf::from(flag_value(args, index)?)),
            "--frames" => {
                let value = flag_value(args, index)?;
                options.frames = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("invalid --frames value '{value}' (expected u32)"))?,
                );
            }
            "--seed" => {
                let value = flag_value(args, index)?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --seed value '{value}' (expected u64)"))?,
                );
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
        index += 2;
    }
    Ok(CliCommand::Run(options))
}

fn flag_value(args: &[String], index: usize) -> Result<&str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {}", args[index]))
}

pub(crate) fn usage_text() -> String {
    [
        "game - headless tile world demo",
        "",
        "Usage:",
        "  game [--config <file.json>] [--load <map>] [--save <map>] [--sprites <dir>] [--frames <u32>] [--seed <u64>]",
        "",
        "Map files ending in .mapbin use the binary pack format; anything else is text.",
        "",
        "Defaults:",
        "  sprites are read from <root>/assets/sprites",
        "  bare --load/--save file names resolve inside <root>/saves",
        "  a fresh map is generated when --load is absent",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_runs_with_defaults() {
        assert_eq!(
            parse_args(&[]).expect("parse"),
            CliCommand::Run(CliOptions::default())
        );
    }

    #[test]
    fn parses_every_flag() {
        let parsed = parse_args(&args(&[
            "--config", "game.json", "--load", "a.map", "--save", "b.mapbin", "--sprites", "art",
            "--frames", "12", "--seed", "99",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliCommand::Run(CliOptions {
                config_path: Some(PathBuf::from("game.json")),
                load_path: Some(PathBuf::from("a.map")),
                save_path: Some(PathBuf::from("b.mapbin")),
                sprites_dir: Some(PathBuf::from("art")),
                frames: Some(12),
                seed: Some(99),
            })
        );
    }

    #[test]
    fn help_wins_over_other_flags() {
        assert_eq!(
            parse_args(&args(&["--frames", "3", "--help"])).expect("parse"),
            CliCommand::Help
        );
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        assert_eq!(
            parse_args(&args(&["--save"])).expect_err("err"),
            "missing value for --save"
        );
        assert_eq!(
            parse_args(&args(&["--frames", "many"])).expect_err("err"),
            "invalid --frames value 'many' (expected u32)"
        );
        assert!(parse_args(&args(&["--fast"]))
            .expect_err("err")
            .starts_with("unknown argument '--fast'"));
    }
}
