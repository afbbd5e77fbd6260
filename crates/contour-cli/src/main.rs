use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contour_core::ranker::request_limit;
use contour_core::{
    Analyzer, CalibrationConfig, Catalog, Difficulty, Explanations, FaceShape, LandmarkSet,
    ModelOutput, OnnxShapeClassifier, RankOptions, ShapeClassifier, SortBy,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "contour", about = "Face-shape analysis and hairstyle recommendations")]
struct Cli {
    /// Hairstyle catalog TOML (default: built-in catalog)
    #[arg(long, global = true, env = "CONTOUR_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Classifier calibration TOML (default: built-in calibration)
    #[arg(long, global = true, env = "CONTOUR_CALIBRATION_PATH")]
    calibration: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a face from landmarks and/or a photo, then recommend hairstyles
    Analyze {
        /// Landmark JSON: a list of [x, y(, z)] points or {id, x, y, z} objects
        #[arg(long)]
        landmarks: Option<PathBuf>,
        /// Image classifier output JSON ({shape_label, probabilities})
        #[arg(long, conflicts_with = "image")]
        model_output: Option<PathBuf>,
        /// Photo to run through the local image classifier
        #[arg(long)]
        image: Option<PathBuf>,
        /// Directory holding the ONNX classifier
        #[arg(long, env = "CONTOUR_MODEL_DIR")]
        model_dir: Option<PathBuf>,
        /// Number of recommendations (1-20)
        #[arg(short, long)]
        limit: Option<i64>,
        /// Order by "popularity" or "difficulty"
        #[arg(long, default_value = "popularity")]
        sort_by: SortBy,
    },
    /// Recommend hairstyles for a known face shape
    Recommend {
        /// oval, round, square, heart, diamond or oblong
        shape: FaceShape,
        #[arg(short, long)]
        limit: Option<i64>,
        #[arg(long, default_value = "popularity")]
        sort_by: SortBy,
        /// Only styles of this difficulty (easy, medium, hard)
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Only styles at least this popular
        #[arg(long)]
        min_popularity: Option<u32>,
    },
    /// Show the ideal proportions of each face shape
    Profiles,
    /// List the hairstyle catalog
    Catalog,
    /// Show daemon status
    Status,
}

#[zbus::proxy(
    interface = "org.contour.Contour1",
    default_service = "org.contour.Contour1",
    default_path = "/org/contour/Contour1"
)]
trait Contour {
    async fn status(&self) -> zbus::Result<String>;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let src = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer> {
    let calibration = match &cli.calibration {
        Some(path) => CalibrationConfig::load(path)?,
        None => CalibrationConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    let explanations = Explanations::builtin()?;
    Ok(Analyzer::from_parts(
        &calibration,
        Arc::new(catalog),
        Arc::new(explanations),
    )?)
}

/// Classifier output from a file, or from running the local model on a photo.
///
/// A photo the model cannot handle is reported and treated as absent.
fn model_output(
    model_output: Option<&Path>,
    image: Option<&Path>,
    model_dir: Option<&Path>,
) -> Result<Option<ModelOutput>> {
    if let Some(path) = model_output {
        return Ok(Some(read_json(path)?));
    }
    let Some(image) = image else {
        return Ok(None);
    };

    let dir = model_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(contour_core::default_model_dir);
    let prediction = OnnxShapeClassifier::load(&dir).and_then(|mut c| c.predict(image));
    match prediction {
        Ok(output) => Ok(Some(output)),
        Err(e) => {
            eprintln!("warning: image classifier unavailable: {e}");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            landmarks,
            model_output: output_path,
            image,
            model_dir,
            limit,
            sort_by,
        } => {
            let analyzer = build_analyzer(&cli)?;
            let landmarks: Option<LandmarkSet> = landmarks.as_deref().map(read_json).transpose()?;
            let model = model_output(output_path.as_deref(), image.as_deref(), model_dir.as_deref())?;

            let opts = RankOptions {
                sort_by: *sort_by,
                ..RankOptions::with_limit(request_limit(*limit))
            };
            let analysis = analyzer.analyze(landmarks.as_ref(), model.as_ref(), &opts)?;
            print_json(&analysis)?;
        }
        Commands::Recommend {
            shape,
            limit,
            sort_by,
            difficulty,
            min_popularity,
        } => {
            let analyzer = build_analyzer(&cli)?;
            let opts = RankOptions {
                limit: request_limit(*limit),
                sort_by: *sort_by,
                min_popularity: *min_popularity,
                difficulty: *difficulty,
            };
            let recommendations = analyzer.ranker().recommend(*shape, &opts);
            print_json(&serde_json::json!({
                "face_shape": shape,
                "count": recommendations.len(),
                "recommendations": recommendations,
            }))?;
        }
        Commands::Profiles => {
            let analyzer = build_analyzer(&cli)?;
            print_json(analyzer.geometric().profiles())?;
        }
        Commands::Catalog => {
            let analyzer = build_analyzer(&cli)?;
            print_json(analyzer.ranker().catalog())?;
        }
        Commands::Status => {
            let conn = zbus::Connection::session()
                .await
                .context("connecting to session bus")?;
            let proxy = ContourProxy::new(&conn).await?;
            match proxy.status().await {
                Ok(status) => println!("{status}"),
                Err(e) => println!("contourd: not connected ({e})"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_recommend_filters() {
        let cli = Cli::try_parse_from([
            "contour",
            "recommend",
            "Heart",
            "--limit",
            "3",
            "--difficulty",
            "easy",
            "--sort-by",
            "difficulty",
        ])
        .unwrap();
        match cli.command {
            Commands::Recommend {
                shape,
                limit,
                sort_by,
                difficulty,
                min_popularity,
            } => {
                assert_eq!(shape, FaceShape::Heart);
                assert_eq!(limit, Some(3));
                assert_eq!(sort_by, SortBy::Difficulty);
                assert_eq!(difficulty, Some(Difficulty::Easy));
                assert_eq!(min_popularity, None);
            }
            _ => panic!("expected recommend"),
        }
    }

    #[test]
    fn test_model_output_and_image_conflict() {
        let parsed = Cli::try_parse_from([
            "contour",
            "analyze",
            "--model-output",
            "out.json",
            "--image",
            "face.jpg",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_no_model_inputs_is_absent() {
        assert!(model_output(None, None, None).unwrap().is_none());
    }
}
