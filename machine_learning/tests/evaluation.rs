use std::{num::NonZeroUsize, sync::Arc};

use machine_learning::{
    Gradient, LabeledPoint, MlErr, Model,
    dataset::two_blobs,
    model::GradientFn,
    optimization::{Fgd, GradientDescent, Regularization, Sgd},
    training::{Regression, Svm},
};
use ndarray::array;
use worker::{Cluster, ParameterVector, Partition, WorkerCtx};

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn single_ctx() -> WorkerCtx {
    WorkerCtx::group(nz(1)).remove(0)
}

async fn avg_error_with(nworkers: usize, points: Vec<LabeledPoint>) -> Vec<f32> {
    let cluster = Cluster::new(nz(nworkers));

    cluster
        .run(cluster.scatter(points), |ctx, data: Partition<LabeledPoint>| async move {
            let mut model = Model::new();
            model.set_num_param(&ctx, 3)?;
            model.set_error_fn(Svm::error);
            model.params_mut()?.assign(&[1., 0.5, -0.2]).await?;

            model.avg_error(&ctx, &data).await
        })
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn avg_error_does_not_depend_on_the_partitioning() {
    let points = two_blobs(15, 0.5, 1.5, 3).unwrap().points;

    let single = avg_error_with(1, points.clone()).await;
    let multi = avg_error_with(3, points).await;

    assert!(single[0] > 0. && single[0] < 1.);
    assert!(multi.iter().all(|&e| e == single[0]), "{multi:?} != {single:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_lambda_matches_no_regularization() {
    let data = Partition::from(two_blobs(20, 1., 1., 9).unwrap().points);

    let mut trajectories = Vec::new();
    for lambda in [Some(0.), None] {
        let ctx = single_ctx();
        let mut model = Model::new();
        model.set_num_param(&ctx, 3).unwrap();
        model.set_gradient_fn(Svm::gradient);
        model.set_error_fn(Svm::error);

        let mut regression = Regression::new(model);
        if let Some(lambda) = lambda {
            regression.set_regularization_factor(lambda).unwrap();
        }

        let mut trajectory = Vec::new();
        for _ in 0..5 {
            regression.train::<Sgd>(&ctx, &data, 1, 0.1).await.unwrap();
            trajectory.push(regression.model().params().unwrap().get_all());
        }
        trajectories.push(trajectory);
    }

    assert_eq!(trajectories[0], trajectories[1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_learning_rate_is_rejected() {
    let ctx = single_ctx();
    let data = Partition::from(vec![LabeledPoint::new(array![1f32, 1.], 1.)]);

    let mut svm = Svm::build(&ctx, 2, 0.1).unwrap();
    let err = svm.train::<Sgd>(&ctx, &data, 3, 0.).await.unwrap_err();

    assert!(matches!(err, MlErr::Precondition(_)));
    assert!(!svm.model().is_trained());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unset_functions_are_rejected() {
    let ctx = single_ctx();
    let data = Partition::from(vec![LabeledPoint::new(array![1f32], 1.)]);

    let mut model = Model::new();
    model.set_num_param(&ctx, 2).unwrap();
    let mut regression = Regression::new(model);

    let err = regression.train::<Sgd>(&ctx, &data, 1, 0.1).await.unwrap_err();
    assert!(matches!(err, MlErr::Precondition(_)));

    regression.model_mut().set_gradient_fn(Svm::gradient);
    let err = regression.train::<Sgd>(&ctx, &data, 1, 0.1).await.unwrap_err();
    assert!(matches!(err, MlErr::Precondition(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_parameters_are_rejected() {
    let ctx = single_ctx();
    let data = Partition::from(vec![LabeledPoint::new(array![1f32], 1.)]);

    let mut model = Model::new();
    model.set_num_param(&ctx, 0).unwrap();
    model.set_gradient_fn(Svm::gradient);
    model.set_error_fn(Svm::error);

    let err = Regression::new(model)
        .train::<Sgd>(&ctx, &data, 1, 0.1)
        .await
        .unwrap_err();
    assert!(matches!(err, MlErr::Precondition(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversized_records_are_rejected() {
    let ctx = single_ctx();
    let data = Partition::from(vec![LabeledPoint::new(array![1f32, 2., 3.], 1.)]);

    let mut svm = Svm::build(&ctx, 2, 0.1).unwrap();
    let err = svm.train::<Sgd>(&ctx, &data, 1, 0.1).await.unwrap_err();

    assert!(matches!(
        err,
        MlErr::SizeMismatch {
            got: 3,
            expected: 2,
            ..
        }
    ));
}

#[test]
fn l1_is_not_implemented() {
    let ctx = single_ctx();
    let mut svm = Svm::build(&ctx, 2, 0.1).unwrap();

    assert!(matches!(
        svm.set_regularization(1, 0.1),
        Err(MlErr::Unimplemented(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_training_set_is_fatal() {
    let cluster = Cluster::new(nz(2));
    let inputs = vec![Partition::default(), Partition::default()];

    let res = cluster
        .run(inputs, |ctx, data: Partition<LabeledPoint>| async move {
            let mut svm = Svm::build(&ctx, 2, 0.1)?;
            svm.train::<Sgd>(&ctx, &data, 5, 0.1).await
        })
        .await;

    assert!(matches!(res, Err(MlErr::EmptyDataset(_))));
}

async fn one_regularized_round<G>(nworkers: usize, lambda: f32, learning_rate: f32) -> Vec<Vec<f32>>
where
    G: GradientDescent + Send + 'static,
{
    let cluster = Cluster::new(nz(nworkers));
    let points: Vec<_> = (0..nworkers)
        .map(|i| LabeledPoint::new(array![i as f32], 1.))
        .collect();

    cluster
        .run(cluster.scatter(points), move |ctx, data: Partition<LabeledPoint>| async move {
            let zero: GradientFn = Arc::new(|_: &LabeledPoint, _: &[f32]| Gradient::new());
            let mut engine = G::with_gradient(zero, learning_rate);
            engine.set_regularization(Some(Regularization::l2(lambda)?));

            let mut params = ParameterVector::zeros(&ctx, nz(2))?;
            params.assign(&[1., 1.]).await?;

            engine
                .update_params(&ctx, &data, &mut params, nworkers)
                .await?;
            Ok::<_, MlErr>(params.get_all())
        })
        .await
        .unwrap()
}

fn assert_close(got: &[f32], expected: &[f32]) {
    assert!(
        got.iter().zip(expected).all(|(g, e)| (g - e).abs() < 1e-6),
        "{got:?} != {expected:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sgd_shrinks_once_per_round() {
    for params in one_regularized_round::<Sgd>(3, 0.5, 0.1).await {
        assert_close(&params, &[0.95, 0.95]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fgd_shrinks_once_per_round_and_skips_the_bias() {
    for params in one_regularized_round::<Fgd>(3, 0.5, 0.1).await {
        assert_close(&params, &[0.95, 1.]);
    }
}
