use std::sync::Arc;
use std::time::Duration;

use forum_core::domain::{RATING_UPDATED_EVENT, Submission, User};
use forum_core::ports::RatingRepository;
use forum_core::{DomainError, RatingService};
use forum_infra::broadcast::RoomMessage;
use forum_infra::{InMemoryBroadcaster, InMemoryRatingRepository};
use tokio::sync::broadcast::Receiver;
use uuid::Uuid;

struct Harness {
    service: RatingService,
    repo: Arc<InMemoryRatingRepository>,
    broadcaster: Arc<InMemoryBroadcaster>,
}

fn harness() -> Harness {
    let repo = Arc::new(InMemoryRatingRepository::new());
    let broadcaster = Arc::new(InMemoryBroadcaster::default());
    let service = RatingService::new(repo.clone(), broadcaster.clone());
    Harness {
        service,
        repo,
        broadcaster,
    }
}

async fn next_event(rx: &mut Receiver<RoomMessage>) -> RoomMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no event within a second")
        .expect("room closed")
}

#[tokio::test]
async fn test_resubmission_overwrites_single_rating() {
    let h = harness();
    let (post, user) = (Uuid::new_v4(), Uuid::new_v4());

    let first = h.service.submit(post, user, 5).await.unwrap();
    assert!(matches!(first, Submission::Created(_)));
    let aggregate = h.service.aggregate(post).await;
    assert_eq!((aggregate.average_rating, aggregate.count), (5.0, 1));

    let second = h.service.submit(post, user, 3).await.unwrap();
    assert!(matches!(second, Submission::Updated(_)));
    assert_eq!(second.rating().id, first.rating().id);

    let aggregate = h.service.aggregate(post).await;
    assert_eq!((aggregate.average_rating, aggregate.count), (3.0, 1));

    let stored = h.repo.find(post, user).await.unwrap().unwrap();
    assert_eq!(stored.score.get(), 3);
}

#[tokio::test]
async fn test_two_users_average() {
    let h = harness();
    let post = Uuid::new_v4();

    h.service.submit(post, Uuid::new_v4(), 4).await.unwrap();
    h.service.submit(post, Uuid::new_v4(), 2).await.unwrap();

    let aggregate = h.service.aggregate(post).await;
    assert_eq!(aggregate.average_rating, 3.0);
    assert_eq!(aggregate.count, 2);
}

#[tokio::test]
async fn test_unrated_post_aggregate_is_zero() {
    let h = harness();

    let aggregate = h.service.aggregate(Uuid::new_v4()).await;

    assert_eq!(aggregate.average_rating, 0.0);
    assert_eq!(aggregate.count, 0);
}

#[tokio::test]
async fn test_average_is_rounded_mean_for_varied_sets() {
    let cases: &[(&[i64], f64)] = &[
        (&[5], 5.0),
        (&[1, 2, 2], 1.7),
        (&[3, 4, 4, 5], 4.0),
        (&[1, 5, 5, 5, 5, 5], 4.3),
        (&[2, 3], 2.5),
    ];

    for (scores, expected) in cases {
        let h = harness();
        let post = Uuid::new_v4();
        for score in scores.iter() {
            h.service.submit(post, Uuid::new_v4(), *score).await.unwrap();
        }

        let aggregate = h.service.aggregate(post).await;
        assert_eq!(aggregate.average_rating, *expected, "scores {:?}", scores);
        assert_eq!(aggregate.count, scores.len() as u64);
    }
}

#[tokio::test]
async fn test_boundary_scores_rejected() {
    let h = harness();
    let (post, user) = (Uuid::new_v4(), Uuid::new_v4());

    for value in [0, 6] {
        let err = h.service.submit(post, user, value).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    assert!(h.repo.find(post, user).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_pair_is_not_found() {
    let h = harness();

    let err = h
        .service
        .delete(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_every_mutation_broadcasts_full_aggregate() {
    let h = harness();
    let post = Uuid::new_v4();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let mut room = h.broadcaster.subscribe(&post.to_string()).await;

    h.service.submit(post, alice, 4).await.unwrap();
    let event = next_event(&mut room).await;
    assert_eq!(event.event, RATING_UPDATED_EVENT);
    assert_eq!(event.payload["postId"], post.to_string());
    assert_eq!(event.payload["averageRating"], 4.0);
    assert_eq!(event.payload["count"], 1);

    h.service.submit(post, bob, 1).await.unwrap();
    let event = next_event(&mut room).await;
    assert_eq!(event.payload["averageRating"], 2.5);
    assert_eq!(event.payload["count"], 2);

    h.service.update(post, bob, 5).await.unwrap();
    let event = next_event(&mut room).await;
    assert_eq!(event.payload["averageRating"], 4.5);

    let remaining = h.service.delete(post, alice).await.unwrap();
    assert_eq!(remaining.count, 1);
    let event = next_event(&mut room).await;
    assert_eq!(event.payload["averageRating"], 5.0);
    assert_eq!(event.payload["count"], 1);

    // Rejected mutations stay silent.
    assert!(h.service.update(post, alice, 3).await.is_err());
    assert!(h.service.submit(post, alice, 7).await.is_err());
    assert!(room.try_recv().is_err());
}

#[tokio::test]
async fn test_listing_is_newest_first_with_raters() {
    let h = harness();
    let post = Uuid::new_v4();
    let carol = User::new("carol".to_string(), "carol@uni.example".to_string());
    h.repo.add_user(carol.clone()).await;

    h.service.submit(post, carol.id, 2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    h.service.submit(post, Uuid::new_v4(), 5).await.unwrap();

    let listed = h.service.list_for_post(post).await.unwrap();

    assert_eq!(listed.ratings.len(), 2);
    assert_eq!(listed.ratings[0].rating.score.get(), 5);
    assert!(listed.ratings[0].rater.is_none());
    assert_eq!(listed.ratings[1].rater.as_ref().unwrap().username, "carol");
    assert_eq!(listed.aggregate.average_rating, 3.5);
    assert_eq!(listed.aggregate.count, 2);
}
