use std::num::NonZeroUsize;

use machine_learning::{
    LabeledPoint, MlErr,
    dataset::two_blobs,
    optimization::{Fgd, Sgd},
    training::{Svm, TrainingReport},
};
use worker::{Cluster, Partition};

type Shards = (Partition<LabeledPoint>, Partition<LabeledPoint>);

fn blob_shards(cluster: &Cluster, noise: f32) -> Vec<Shards> {
    let train = two_blobs(50, 2., noise, 1).unwrap();
    let test = two_blobs(50, 2., noise, 2).unwrap();

    cluster
        .scatter(train.points)
        .into_iter()
        .zip(cluster.scatter(test.points))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sgd_separates_two_blobs() {
    let cluster = Cluster::new(NonZeroUsize::new(2).unwrap());

    let results = cluster
        .run(
            blob_shards(&cluster, 0.3),
            |ctx, (train, test): Shards| async move {
                let mut svm = Svm::build(&ctx, 2, 0.01)?;
                svm.set_report_per_round(true);

                let report = svm.train::<Sgd>(&ctx, &train, 20, 0.1).await?;
                let error = svm.model().avg_error(&ctx, &test).await?;
                Ok::<_, MlErr>((report, error, svm.model().is_trained()))
            },
        )
        .await
        .unwrap();

    for (report, error, trained) in results {
        assert_eq!(report.rounds, 20);
        assert_eq!(report.losses.len(), 20);
        assert!(report.test_errors.is_empty());
        assert!(error < 0.01, "test error too high: {error}");
        assert!(trained);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fgd_separates_two_blobs() {
    let cluster = Cluster::new(NonZeroUsize::new(3).unwrap());

    let errors = cluster
        .run(
            blob_shards(&cluster, 0.3),
            |ctx, (train, test): Shards| async move {
                let mut svm = Svm::build(&ctx, 2, 0.01)?;
                svm.train::<Fgd>(&ctx, &train, 10, 1.).await?;
                svm.model().avg_error(&ctx, &test).await
            },
        )
        .await
        .unwrap();

    assert!(errors.iter().all(|&e| e < 0.01), "test errors: {errors:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_worker_reports_the_same_run() {
    let cluster = Cluster::new(NonZeroUsize::new(4).unwrap());

    let reports: Vec<(TrainingReport, Vec<f32>)> = cluster
        .run(
            blob_shards(&cluster, 1.),
            |ctx, (train, test): Shards| async move {
                let mut svm = Svm::build(&ctx, 2, 0.01)?;
                svm.set_report_per_round(true);

                let report = svm.train_test::<Sgd>(&ctx, &train, &test, 5, 0.05).await?;
                Ok::<_, MlErr>((report, svm.model().params()?.get_all()))
            },
        )
        .await
        .unwrap();

    let (first, params) = &reports[0];
    assert!(first.rounds >= 1 && first.rounds <= 5);
    assert_eq!(first.test_errors.len(), first.rounds);

    for (report, other) in &reports[1..] {
        assert_eq!(report.rounds, first.rounds);
        assert_eq!(report.stop_reason, first.stop_reason);
        assert_eq!(report.losses, first.losses);
        assert_eq!(report.test_errors, first.test_errors);
        assert_eq!(other, params);
    }
}
