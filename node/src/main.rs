mod config;
mod error;

use std::env;

use log::info;
use machine_learning::{
    LabeledPoint, MlErr,
    dataset::{Dataset, load_data, two_blobs},
    optimization::{Fgd, GradientDescent, Sgd},
    training::{Svm, TrainingReport},
};
use worker::{Cluster, Partition, WorkerCtx};

use config::{DatasetSource, NodeConfig, OptimizerConfig};
use error::NodeErr;

const CONFIG_VAR: &str = "NODE_CONFIG";

type Shards = (Partition<LabeledPoint>, Partition<LabeledPoint>);

#[tokio::main]
async fn main() -> Result<(), NodeErr> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_VAR).ok())
        .ok_or_else(|| {
            NodeErr::Config(format!("usage: node <config.json> (or set {CONFIG_VAR})"))
        })?;

    let config = NodeConfig::from_file(&path)?;
    info!(workers = config.workers.get(), iterations = config.n_iter; "loaded config from {path}");

    let (train, test) = load(config.source()?)?;
    let num_features = train.num_features.max(test.num_features);
    info!(
        train = train.len(), test = test.len(), features = num_features;
        "datasets loaded"
    );

    let cluster = Cluster::new(config.workers);
    let inputs: Vec<Shards> = cluster
        .scatter(train.points)
        .into_iter()
        .zip(cluster.scatter(test.points))
        .collect();

    let results = cluster
        .run(inputs, |ctx, (train, test): Shards| {
            let config = config.clone();

            async move {
                match config.optimizer {
                    OptimizerConfig::Sgd => {
                        run_svm::<Sgd>(&ctx, &config, num_features, &train, &test).await
                    }
                    OptimizerConfig::Fgd => {
                        run_svm::<Fgd>(&ctx, &config, num_features, &train, &test).await
                    }
                }
            }
        })
        .await?;

    if let Some((report, test_error)) = results.first() {
        info!(
            rounds = report.rounds, elapsed_secs = report.elapsed.as_secs_f64();
            "finished ({:?}), the error rate on the testing set is {test_error}", report.stop_reason
        );
    }

    Ok(())
}

fn load(source: DatasetSource) -> Result<(Dataset, Dataset), NodeErr> {
    let datasets = match source {
        DatasetSource::Files {
            train,
            test,
            format,
            sparse,
        } => (
            load_data(train, format, sparse)?,
            load_data(test, format, sparse)?,
        ),
        DatasetSource::Synthetic(cfg) => (
            two_blobs(cfg.points_per_class, cfg.center, cfg.noise, cfg.seed)?,
            two_blobs(cfg.points_per_class, cfg.center, cfg.noise, cfg.seed.wrapping_add(1))?,
        ),
    };

    Ok(datasets)
}

/// The program every worker runs: trains an SVM over its shard and evaluates it.
async fn run_svm<G: GradientDescent>(
    ctx: &WorkerCtx,
    config: &NodeConfig,
    num_features: usize,
    train: &Partition<LabeledPoint>,
    test: &Partition<LabeledPoint>,
) -> Result<(TrainingReport, f32), MlErr> {
    let mut svm = Svm::build(ctx, num_features, config.lambda)?;
    svm.set_report_per_round(config.report_per_round);

    let report = if config.early_stopping {
        svm.train_test::<G>(ctx, train, test, config.n_iter, config.alpha)
            .await?
    } else {
        svm.train::<G>(ctx, train, config.n_iter, config.alpha)
            .await?
    };

    let test_error = svm.model().avg_error(ctx, test).await?;
    if ctx.is_root() {
        svm.model().present_params();
        info!("the error rate on the testing set = {test_error}");
    }

    Ok((report, test_error))
}
