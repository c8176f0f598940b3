mod common;

use common::TestApp;
use futures_util::future::join_all;
use tandem::application_port::RelationError;
use tandem::domain_model::*;

#[tokio::test]
async fn propose_accept_then_both_list_each_other() {
    let app = TestApp::new();
    let a = app.user("Ines", true).await;
    let b = app.user("Tomasz", true).await;
    let service = &app.server.relationship_service;

    let request_id = service.propose(a, b).await.unwrap();

    let incoming = service
        .list_incoming(b, FriendRequestStatus::Pending, PageSize::DEFAULT, None)
        .await
        .unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].request.request_id, request_id);
    assert_eq!(incoming[0].counterpart.full_name, "Ines");

    service.accept(b, request_id).await.unwrap();

    let a_friends = service.list_friends(a).await.unwrap();
    let b_friends = service.list_friends(b).await.unwrap();
    assert_eq!(a_friends.len(), 1);
    assert_eq!(a_friends[0].user_id, b);
    assert_eq!(b_friends.len(), 1);
    assert_eq!(b_friends[0].user_id, a);

    let overview = service.overview(a, PageSize::DEFAULT).await.unwrap();
    assert!(overview.incoming.is_empty());
    assert_eq!(overview.accepted.len(), 1);
    assert_eq!(overview.accepted[0].counterpart.user_id, b);
}

#[tokio::test]
async fn withdraw_then_propose_again_in_reverse() {
    let app = TestApp::new();
    let a = app.user("Ines", true).await;
    let b = app.user("Tomasz", true).await;
    let service = &app.server.relationship_service;

    service.propose(a, b).await.unwrap();
    service.withdraw(a, b).await.unwrap();
    assert_eq!(app.pending_between(a, b).await, 0);

    let err = service.withdraw(a, b).await.unwrap_err();
    assert!(matches!(err, RelationError::PendingRequestNotFound));

    service.propose(b, a).await.unwrap();
    assert_eq!(app.pending_between(a, b).await, 1);
}

#[tokio::test]
async fn recommendations_hide_self_friends_and_newcomers() {
    let app = TestApp::new();
    let a = app.user("Ines", true).await;
    let b = app.user("Tomasz", true).await;
    let c = app.user("Wen", true).await;
    let _pending_onboarding = app.user("New", false).await;
    let service = &app.server.relationship_service;

    let id = service.propose(a, b).await.unwrap();

    // a pending request does not hide the account
    let before: Vec<UserId> = service
        .list_recommendations(a)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.user_id)
        .collect();
    assert_eq!(before.len(), 2);
    assert!(before.contains(&b) && before.contains(&c));

    service.accept(b, id).await.unwrap();

    let after: Vec<UserId> = service
        .list_recommendations(a)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.user_id)
        .collect();
    assert_eq!(after, vec![c]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_crossing_proposals_create_one_request() {
    let app = TestApp::new();
    let service = app.server.relationship_service.clone();

    for _ in 0..25 {
        let a = app.user("a", true).await;
        let b = app.user("b", true).await;

        let (ab, ba) = tokio::join!(
            tokio::spawn({
                let service = service.clone();
                async move { service.propose(a, b).await }
            }),
            tokio::spawn({
                let service = service.clone();
                async move { service.propose(b, a).await }
            }),
        );
        let results = [ab.unwrap(), ba.unwrap()];

        let created = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(RelationError::FriendRequestExists)))
        );
        assert_eq!(app.pending_between(a, b).await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_leave_symmetric_friend_sets() {
    let app = TestApp::new();
    let service = app.server.relationship_service.clone();
    let hub = app.user("hub", true).await;

    let mut requests = Vec::new();
    let mut others = Vec::new();
    for i in 0..20 {
        let other = app.user(&format!("user-{i}"), true).await;
        requests.push(service.propose(other, hub).await.unwrap());
        others.push(other);
    }

    let results = join_all(requests.into_iter().map(|id| {
        let service = service.clone();
        tokio::spawn(async move { service.accept(hub, id).await })
    }))
    .await;
    for r in results {
        r.unwrap().unwrap();
    }

    let hub_friends = app.friends_of(hub).await;
    assert_eq!(hub_friends.len(), others.len());
    for other in others {
        assert!(hub_friends.contains(&other));
        assert_eq!(app.friends_of(other).await, vec![hub]);
    }
}

#[tokio::test]
async fn outgoing_listing_pages_newest_first() {
    let app = TestApp::new();
    let me = app.user("me", true).await;
    let service = &app.server.relationship_service;

    let mut sent = Vec::new();
    for i in 0..5 {
        let target = app.user(&format!("t{i}"), true).await;
        sent.push(service.propose(me, target).await.unwrap());
    }

    let first = service
        .list_outgoing(me, FriendRequestStatus::Pending, PageSize(3), None)
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    let cursor = first.last().unwrap().request.cursor();

    let second = service
        .list_outgoing(me, FriendRequestStatus::Pending, PageSize(3), Some(cursor))
        .await
        .unwrap();
    assert_eq!(second.len(), 2);

    let listed: Vec<FriendRequestId> = first
        .iter()
        .chain(second.iter())
        .map(|v| v.request.request_id)
        .collect();
    for id in &sent {
        assert!(listed.contains(id));
    }
    for pair in first.iter().chain(second.iter()).collect::<Vec<_>>().windows(2) {
        assert!(pair[0].request.cursor() > pair[1].request.cursor());
    }

    let accepted = service
        .list_outgoing(me, FriendRequestStatus::Accepted, PageSize::DEFAULT, None)
        .await
        .unwrap();
    assert!(accepted.is_empty());
}
