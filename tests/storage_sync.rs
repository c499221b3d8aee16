//! Storage-level behavior: upsert idempotence (sync convergence), dedup
//! against the stored identifier sets, and member role management.

use church_rust::storage::{NewNewsPost, NewSermonPost, Storage};
use church_rust::sync::dedup;

async fn test_storage() -> (Storage, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let storage = Storage::new(&url).await.expect("storage init");
    (storage, dir)
}

fn sermon(title: &str, url: &str) -> NewSermonPost {
    NewSermonPost {
        title: title.to_string(),
        youtube_url: url.to_string(),
        video_id: "abcdefghijk".to_string(),
        thumbnail_url: None,
        preacher: "주일설교".to_string(),
        published_at: None,
    }
}

fn bulletin(title: &str, file_id: &str) -> NewNewsPost {
    NewNewsPost {
        title: title.to_string(),
        content: String::new(),
        image_url: format!("https://drive.google.com/thumbnail?id={}&sz=w1600", file_id),
        link_url: None,
        drive_file_id: Some(file_id.to_string()),
        published_at: None,
    }
}

#[tokio::test]
async fn sermon_upsert_is_idempotent_and_last_write_wins() {
    let (storage, _dir) = test_storage().await;
    let url = "https://www.youtube.com/watch?v=abcdefghijk";

    storage
        .upsert_sermon(sermon("2025.11.23 주일설교", url))
        .await
        .expect("first upsert");
    storage
        .upsert_sermon(sermon("2025.11.23 주일설교 (수정)", url))
        .await
        .expect("second upsert");

    assert_eq!(storage.sermon_count().await.expect("count"), 1);

    let sermons = storage.list_sermons().await.expect("list");
    assert_eq!(sermons[0].title, "2025.11.23 주일설교 (수정)");
}

#[tokio::test]
async fn second_sync_run_over_unchanged_catalog_inserts_nothing() {
    let (storage, _dir) = test_storage().await;

    let catalog = vec![
        "https://www.youtube.com/watch?v=aaaaaaaaaaa",
        "https://www.youtube.com/watch?v=bbbbbbbbbbb",
    ];

    // First run: nothing stored yet, everything is new
    let existing = storage.existing_sermon_urls().await.expect("read set");
    let fresh = dedup::filter_new(catalog.clone(), &existing, |url| *url);
    assert_eq!(fresh.len(), 2);
    for url in &fresh {
        storage
            .upsert_sermon(sermon("2025.11.23 주일설교", url))
            .await
            .expect("persist");
    }

    // Second run over the same catalog: the identifier set now covers it
    let existing = storage.existing_sermon_urls().await.expect("read set");
    let fresh = dedup::filter_new(catalog, &existing, |url| *url);
    assert!(fresh.is_empty(), "unchanged catalog must sync zero records");
    assert_eq!(storage.sermon_count().await.expect("count"), 2);
}

#[tokio::test]
async fn bulletin_upsert_keys_on_drive_file_id() {
    let (storage, _dir) = test_storage().await;

    storage
        .upsert_news(bulletin("1123_주일주보", "file-1"))
        .await
        .expect("first upsert");
    storage
        .upsert_news(bulletin("1123_주일주보 (재업로드)", "file-1"))
        .await
        .expect("second upsert");
    storage
        .upsert_news(bulletin("260105_주일주보", "file-2"))
        .await
        .expect("different file");

    assert_eq!(storage.news_count().await.expect("count"), 2);

    let ids = storage.existing_drive_file_ids().await.expect("id set");
    assert!(ids.contains("file-1"));
    assert!(ids.contains("file-2"));
}

#[tokio::test]
async fn manual_bulletins_without_file_id_do_not_collide() {
    let (storage, _dir) = test_storage().await;

    for title in ["행사 안내", "성탄절 안내"] {
        storage
            .insert_news(NewNewsPost {
                title: title.to_string(),
                content: "본문".to_string(),
                image_url: String::new(),
                link_url: None,
                drive_file_id: None,
                published_at: None,
            })
            .await
            .expect("manual insert");
    }

    assert_eq!(storage.news_count().await.expect("count"), 2);
    assert!(storage
        .existing_drive_file_ids()
        .await
        .expect("id set")
        .is_empty());
}

#[tokio::test]
async fn duplicate_manual_sermon_registration_is_rejected() {
    let (storage, _dir) = test_storage().await;
    let url = "https://www.youtube.com/watch?v=abcdefghijk";

    storage
        .insert_sermon(sermon("2025.11.23 주일설교", url))
        .await
        .expect("first insert");

    let err = storage
        .insert_sermon(sermon("다른 제목", url))
        .await
        .expect_err("duplicate must be rejected");
    assert!(err.to_string().contains("already registered"));
}

#[tokio::test]
async fn member_roles_round_trip() {
    let (storage, _dir) = test_storage().await;

    let id = storage
        .create_user("younghee", "secret-pw", "guest")
        .await
        .expect("create user");

    // Initial admin plus the new guest
    let stats = storage.member_stats().await.expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.admin, 1);
    assert_eq!(stats.guest, 1);

    storage
        .update_member_role(&id, "member")
        .await
        .expect("promote");
    let member = storage
        .get_member(&id)
        .await
        .expect("get")
        .expect("member exists");
    assert_eq!(member.role, "member");

    let stats = storage.member_stats().await.expect("stats");
    assert_eq!(stats.member, 1);
    assert_eq!(stats.guest, 0);

    // Unknown roles are refused
    assert!(storage.update_member_role(&id, "owner").await.is_err());
}

#[tokio::test]
async fn login_round_trip_issues_and_verifies_tokens() {
    let (storage, _dir) = test_storage().await;

    storage
        .create_user("younghee", "secret-pw", "member")
        .await
        .expect("create user");

    assert!(storage
        .verify_user("younghee", "wrong")
        .await
        .expect("verify runs")
        .is_none());

    let token = storage
        .verify_user("younghee", "secret-pw")
        .await
        .expect("verify runs")
        .expect("token issued");

    assert_eq!(
        storage.verify_token(&token).await.expect("lookup"),
        Some("younghee".to_string())
    );
    assert!(!storage.verify_admin(&token).await.expect("role check"));
    assert!(!storage.is_admin("younghee").await.expect("role check"));

    storage.logout(&token).await.expect("logout");
    assert_eq!(storage.verify_token(&token).await.expect("lookup"), None);
}
