use std::num::NonZeroUsize;

use machine_learning::{
    LabeledPoint, MlErr, Model,
    dataset::two_blobs,
    optimization::Sgd,
    training::{Regression, Svm},
};
use worker::{Cluster, Partition, WorkerCtx};

const LR: f32 = 0.05;

fn svm_regression(ctx: &WorkerCtx) -> Result<Regression, MlErr> {
    let mut model = Model::new();
    model.set_num_param(ctx, 3)?;
    model.set_gradient_fn(Svm::gradient);
    model.set_error_fn(Svm::error);
    Ok(Regression::new(model))
}

/// Runs a single unregularized round with one worker per shard and returns the parameters.
async fn one_round(shards: Vec<Vec<LabeledPoint>>) -> Vec<f32> {
    let cluster = Cluster::new(NonZeroUsize::new(shards.len()).unwrap());
    let inputs = shards.into_iter().map(Partition::from).collect();

    let params = cluster
        .run(inputs, |ctx, data: Partition<LabeledPoint>| async move {
            let mut regression = svm_regression(&ctx)?;
            regression.train::<Sgd>(&ctx, &data, 1, LR).await?;
            regression.model().params().map(|p| p.get_all())
        })
        .await
        .unwrap();

    params[0].clone()
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() <= 1e-4 * x.abs().max(1.), "{a:?} != {b:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn replicated_shard_matches_single_worker() {
    let data = two_blobs(10, 1., 1., 11).unwrap().points;
    let single = one_round(vec![data.clone()]).await;
    assert!(single.iter().any(|&w| w != 0.));

    for k in 2..=4 {
        let replicated = one_round(vec![data.clone(); k]).await;
        assert_close(&replicated, &single);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn merge_is_weighted_by_partition_size() {
    let mut a = two_blobs(10, 1., 1., 5).unwrap().points;
    let b = a.split_off(12);

    let delta_a = one_round(vec![a.clone()]).await;
    let delta_b = one_round(vec![b.clone()]).await;
    let merged = one_round(vec![a, b]).await;

    let expected: Vec<f32> = delta_a
        .iter()
        .zip(&delta_b)
        .map(|(da, db)| 0.6 * da + 0.4 * db)
        .collect();

    assert_close(&merged, &expected);
}
