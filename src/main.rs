use clap::Parser;
use linear_cut::render;
use linear_cut::search::{DEFAULT_TOP, search};
use linear_cut::solver::optimize;
use linear_cut::types::{Demand, DemandSet, SearchRange};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "linear_cut",
    about = "1D cutting stock optimizer for bars, tubes and profiles"
)]
struct Cli {
    /// Required pieces as LEN:QTY in mm (e.g. 355:10 200:5)
    #[arg(long = "cuts", num_args = 1.., required = true)]
    cuts: Vec<String>,

    /// Stock length in mm to plan against
    #[arg(long, default_value_t = 3800, conflicts_with = "range")]
    stock: u32,

    /// Search stock lengths MIN:MAX in mm instead of using --stock
    #[arg(long)]
    range: Option<String>,

    /// Search step in mm
    #[arg(long, default_value_t = 100, requires = "range")]
    step: u32,

    /// Number of candidate lengths to list after a search
    #[arg(long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log optimizer progress to stderr
    #[arg(long)]
    verbose: bool,
}

fn parse_length(s: &str, what: &str, input: &str) -> Result<u32, String> {
    let value = s
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid {} in '{}'", what, input))?;
    if value == 0 {
        return Err(format!("{} must be non-zero in '{}'", what, input));
    }
    Ok(value)
}

fn parse_cut(s: &str) -> Result<Demand, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid cut '{}', expected LEN:QTY", s));
    }
    let length = parse_length(parts[0], "length", s)?;
    let qty = parse_length(parts[1], "quantity", s)?;
    Ok(Demand::new(length, qty))
}

fn parse_range(s: &str, step: u32) -> Result<SearchRange, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid range '{}', expected MIN:MAX", s));
    }
    let min = parse_length(parts[0], "minimum length", s)?;
    let max = parse_length(parts[1], "maximum length", s)?;
    if min > max {
        return Err(format!("minimum exceeds maximum in '{}'", s));
    }
    if step == 0 {
        return Err("step must be non-zero".to_string());
    }
    Ok(SearchRange::new(min, max, step))
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(e))
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .init();
    }

    let cuts: Vec<Demand> = cli
        .cuts
        .iter()
        .map(|c| parse_cut(c))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));
    let demands = DemandSet::from_demands(cuts).unwrap_or_else(|e| fail(e));

    match &cli.range {
        Some(range) => {
            let range = parse_range(range, cli.step).unwrap_or_else(|e| fail(e));
            let results = search(&demands, range).unwrap_or_else(|e| fail(e));
            if cli.json {
                let shown = &results[..cli.top.min(results.len())];
                println!("{}", to_json(&shown));
            } else {
                print!("{}", render::render_search(&results, cli.top));
            }
        }
        None => {
            let result = optimize(cli.stock, &demands).unwrap_or_else(|e| fail(e));
            if cli.json {
                println!("{}", to_json(&result));
            } else {
                print!("{}", render::render_plan(&result));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cut() {
        assert_eq!(parse_cut("355:10"), Ok(Demand::new(355, 10)));
        assert_eq!(parse_cut(" 200 : 5"), Ok(Demand::new(200, 5)));
        assert!(parse_cut("0:10").is_err());
        assert!(parse_cut("355:0").is_err());
        assert!(parse_cut("355").is_err());
        assert!(parse_cut("355:10:2").is_err());
        assert!(parse_cut("abc:10").is_err());
        assert!(parse_cut("-355:10").is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("1000:5000", 100),
            Ok(SearchRange::new(1000, 5000, 100))
        );
        assert_eq!(
            parse_range("1000:1000", 10),
            Ok(SearchRange::new(1000, 1000, 10))
        );
        assert!(parse_range("5000:1000", 100).is_err());
        assert!(parse_range("1000:5000", 0).is_err());
        assert!(parse_range("0:5000", 100).is_err());
        assert!(parse_range("1000", 100).is_err());
        assert!(parse_range("1000:x", 100).is_err());
    }
}
