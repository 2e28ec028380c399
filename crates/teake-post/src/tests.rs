//! Workflow tests against in-memory test doubles.

use std::{
  collections::{BTreeSet, HashMap},
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use teake_core::{
  guy::{Guy, NewGuy},
  session::SessionProvider,
  store::{GuyQuery, ObjectStore, ObjectStoreError, PostStore, UploadOptions},
  story::{NewStory, Story, Tag},
  user::{UserRecord, VerificationStatus},
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  CreatePostData, ImageSource, PostError, PostResponse, PostService, UploadError,
  error::{STORAGE_FALLBACK_MESSAGE, UNEXPECTED_MESSAGE},
};

// ─── Test doubles ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
  Search(GuyQuery),
  InsertGuy,
  DeleteGuy(Uuid),
  InsertStory,
}

#[derive(Default)]
struct Failures {
  search:       bool,
  insert_guy:   bool,
  insert_story: Option<String>,
}

#[derive(Default)]
struct FakeStore {
  guys:     Mutex<Vec<Guy>>,
  stories:  Mutex<Vec<Story>>,
  calls:    Mutex<Vec<Call>>,
  failures: Mutex<Failures>,
}

impl FakeStore {
  fn record(&self, call: Call) { self.calls.lock().unwrap().push(call); }

  fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

  fn writes(&self) -> Vec<Call> {
    self
      .calls()
      .into_iter()
      .filter(|c| !matches!(c, Call::Search(_)))
      .collect()
  }

  fn seed_guy(&self, name: Option<&str>, phone: Option<&str>, socials: Option<&str>) -> Guy {
    let guy = Guy {
      guy_id:             Uuid::new_v4(),
      name:               name.map(str::to_owned),
      phone:              phone.map(str::to_owned),
      socials:            socials.map(str::to_owned),
      location:           None,
      age:                None,
      created_by_user_id: Uuid::new_v4(),
      created_at:         Utc::now(),
    };
    self.guys.lock().unwrap().push(guy.clone());
    guy
  }

  fn story(&self, id: Uuid) -> Story {
    self
      .stories
      .lock()
      .unwrap()
      .iter()
      .find(|s| s.story_id == id)
      .cloned()
      .expect("story stored")
  }
}

impl PostStore for FakeStore {
  type Error = FakeError;

  async fn search_guys(&self, query: &GuyQuery) -> Result<Vec<Guy>, FakeError> {
    self.record(Call::Search(query.clone()));
    if self.failures.lock().unwrap().search {
      return Err(FakeError("search timed out".into()));
    }
    let guys = self.guys.lock().unwrap();
    Ok(
      guys
        .iter()
        .filter(|g| query.matches(g))
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect(),
    )
  }

  async fn insert_guy(&self, input: NewGuy) -> Result<Guy, FakeError> {
    self.record(Call::InsertGuy);
    if self.failures.lock().unwrap().insert_guy {
      return Err(FakeError("guys: permission denied".into()));
    }
    let guy = Guy {
      guy_id:             Uuid::new_v4(),
      name:               input.name,
      phone:              input.phone,
      socials:            input.socials,
      location:           input.location,
      age:                input.age,
      created_by_user_id: input.created_by_user_id,
      created_at:         Utc::now(),
    };
    self.guys.lock().unwrap().push(guy.clone());
    Ok(guy)
  }

  async fn delete_guy(&self, id: Uuid) -> Result<bool, FakeError> {
    self.record(Call::DeleteGuy(id));
    let mut guys = self.guys.lock().unwrap();
    let before = guys.len();
    guys.retain(|g| g.guy_id != id);
    Ok(guys.len() != before)
  }

  async fn get_guy(&self, id: Uuid) -> Result<Option<Guy>, FakeError> {
    Ok(self.guys.lock().unwrap().iter().find(|g| g.guy_id == id).cloned())
  }

  async fn insert_story(&self, input: NewStory) -> Result<Story, FakeError> {
    self.record(Call::InsertStory);
    if let Some(msg) = self.failures.lock().unwrap().insert_story.clone() {
      return Err(FakeError(msg));
    }
    let story = Story {
      story_id:   Uuid::new_v4(),
      guy_id:     input.guy_id,
      user_id:    input.user_id,
      text:       input.text,
      tags:       input.tags,
      image_url:  input.image_url,
      anonymous:  input.anonymous,
      nickname:   input.nickname,
      created_at: Utc::now(),
    };
    self.stories.lock().unwrap().push(story.clone());
    Ok(story)
  }

  async fn get_story(&self, id: Uuid) -> Result<Option<Story>, FakeError> {
    Ok(self.stories.lock().unwrap().iter().find(|s| s.story_id == id).cloned())
  }

  async fn list_stories_for_guy(&self, guy_id: Uuid) -> Result<Vec<Story>, FakeError> {
    Ok(
      self
        .stories
        .lock()
        .unwrap()
        .iter()
        .rev()
        .filter(|s| s.guy_id == guy_id)
        .cloned()
        .collect(),
    )
  }

  async fn set_story_image(
    &self,
    story_id: Uuid,
    image_url: String,
  ) -> Result<Option<Story>, FakeError> {
    let mut stories = self.stories.lock().unwrap();
    Ok(stories.iter_mut().find(|s| s.story_id == story_id).map(|s| {
      s.image_url = Some(image_url);
      s.clone()
    }))
  }
}

#[derive(Default)]
struct FakeObjects {
  objects: Mutex<HashMap<String, Vec<u8>>>,
  uploads: Mutex<u32>,
  offline: bool,
}

impl ObjectStore for FakeObjects {
  async fn upload(
    &self,
    bucket: &str,
    path: &str,
    body: Vec<u8>,
    options: UploadOptions,
  ) -> Result<String, ObjectStoreError> {
    *self.uploads.lock().unwrap() += 1;
    if self.offline {
      return Err(ObjectStoreError::Backend(Box::new(FakeError("network down".into()))));
    }
    let key = format!("{bucket}/{path}");
    let mut objects = self.objects.lock().unwrap();
    if !options.upsert && objects.contains_key(&key) {
      return Err(ObjectStoreError::AlreadyExists {
        bucket: bucket.to_owned(),
        path:   path.to_owned(),
      });
    }
    objects.insert(key, body);
    Ok(path.to_owned())
  }

  fn public_url(&self, bucket: &str, path: &str) -> String {
    format!("https://cdn.example/{bucket}/{path}")
  }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
  fn local(&self) -> DateTime<Local> { self.0.with_timezone(&Local) }

  fn utc(&self) -> DateTime<Utc> { self.0 }
}

struct BrokenSession;

impl SessionProvider for BrokenSession {
  type Error = FakeError;

  async fn current_user(&self) -> Result<Option<UserRecord>, FakeError> {
    Err(FakeError("secure storage unavailable".into()))
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn fixed_now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() }

struct Harness {
  store:   Arc<FakeStore>,
  objects: Arc<FakeObjects>,
  service: PostService<FakeStore, FakeObjects>,
}

fn harness_with(objects: FakeObjects) -> Harness {
  let store = Arc::new(FakeStore::default());
  let objects = Arc::new(objects);
  let service = PostService::new(
    Arc::clone(&store),
    Arc::clone(&objects),
    Arc::new(FixedClock(fixed_now())),
  );
  Harness { store, objects, service }
}

fn harness() -> Harness { harness_with(FakeObjects::default()) }

fn user(status: VerificationStatus) -> Option<UserRecord> {
  Some(UserRecord {
    user_id:             Uuid::new_v4(),
    email:               Some("me@example.com".into()),
    nickname:            "sweet-tea".into(),
    verification_status: status,
    created_at:          Utc::now(),
  })
}

fn approved() -> Option<UserRecord> { user(VerificationStatus::Approved) }

fn post() -> CreatePostData {
  CreatePostData {
    guy_name: Some("Tom".into()),
    story_text: "  Ghosted me after three dates.  ".into(),
    tags: BTreeSet::from([Tag::Ghosting]),
    ..CreatePostData::default()
  }
}

fn error_of(response: &PostResponse) -> &str {
  assert!(!response.success);
  response.error.as_deref().expect("error message")
}

// ─── Preconditions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_session_is_rejected() {
  let h = harness();
  let resp = h.service.add_post(&None::<UserRecord>, post()).await;
  assert_eq!(error_of(&resp), "You must be logged in to create a post");
  assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn unverified_callers_get_status_specific_messages() {
  let cases = [
    (
      VerificationStatus::Pending,
      "Your verification is still pending. Please wait for approval.",
    ),
    (
      VerificationStatus::Rejected,
      "Your verification was rejected. Please re-upload your ID.",
    ),
    (
      VerificationStatus::Unset,
      "Please verify your identity by uploading your ID to post stories.",
    ),
  ];

  for (status, message) in cases {
    let h = harness();
    let resp = h.service.add_post(&user(status), post()).await;
    assert_eq!(error_of(&resp), message);
    assert!(h.store.calls().is_empty(), "{status} must not touch storage");
  }
}

#[tokio::test]
async fn blank_story_text_is_rejected_without_storage() {
  for text in ["", "   ", "\n\t "] {
    let h = harness();
    let data = CreatePostData { story_text: text.into(), ..post() };
    let resp = h.service.add_post(&approved(), data).await;
    assert_eq!(error_of(&resp), "Story text is required");
    assert!(h.store.calls().is_empty());
  }
}

#[tokio::test]
async fn empty_tags_rejected_before_any_write() {
  let h = harness();
  let data = CreatePostData { tags: BTreeSet::new(), ..post() };
  let resp = h.service.add_post(&approved(), data).await;
  assert_eq!(error_of(&resp), "At least one tag is required");
  assert!(h.store.writes().is_empty());
}

#[tokio::test]
async fn missing_identifiers_rejected_before_any_write() {
  let h = harness();
  let data = CreatePostData {
    guy_name: Some("   ".into()),
    guy_phone: None,
    guy_socials: Some(String::new()),
    guy_location: Some("Denver".into()),
    guy_age: Some(30),
    ..post()
  };
  let resp = h.service.add_post(&approved(), data).await;
  assert_eq!(
    error_of(&resp),
    "Please provide at least the guy's name, phone, or social handle"
  );
  assert!(h.store.writes().is_empty());
}

#[tokio::test]
async fn session_failure_becomes_generic_message() {
  let h = harness();
  let resp = h.service.add_post(&BrokenSession, post()).await;
  assert_eq!(error_of(&resp), UNEXPECTED_MESSAGE);
  assert!(h.store.calls().is_empty());
}

// ─── Guy resolution ──────────────────────────────────────────────────────────

#[tokio::test]
async fn existing_guy_is_reused() {
  let h = harness();
  let existing = h.store.seed_guy(Some("Tommy Lee"), None, None);

  let resp = h.service.add_post(&approved(), post()).await;
  assert!(resp.success);
  assert_eq!(resp.guy_id, Some(existing.guy_id));
  assert_eq!(h.store.writes(), vec![Call::InsertStory]);
}

#[tokio::test]
async fn unknown_guy_is_created_once_before_story() {
  let h = harness();
  h.store.seed_guy(Some("Jerry"), None, None);

  let resp = h.service.add_post(&approved(), post()).await;
  assert!(resp.success);
  assert_eq!(h.store.writes(), vec![Call::InsertGuy, Call::InsertStory]);

  let guy_id = resp.guy_id.unwrap();
  let created = h.store.get_guy(guy_id).await.unwrap().unwrap();
  assert_eq!(created.name.as_deref(), Some("Tom"));

  let story = h.store.story(resp.post_id.unwrap());
  assert_eq!(story.guy_id, guy_id);
}

#[tokio::test]
async fn phone_is_normalized_for_matching_and_storage() {
  let h = harness();
  let data = CreatePostData {
    guy_name: None,
    guy_phone: Some("(555) 123-4567".into()),
    ..post()
  };

  let resp = h.service.add_post(&approved(), data.clone()).await;
  let guy = h.store.get_guy(resp.guy_id.unwrap()).await.unwrap().unwrap();
  assert_eq!(guy.phone.as_deref(), Some("+15551234567"));

  let again = CreatePostData { guy_phone: Some("555-123-4567".into()), ..data };
  let resp2 = h.service.add_post(&approved(), again).await;
  assert_eq!(resp2.guy_id, resp.guy_id);

  let searches: Vec<_> = h
    .store
    .calls()
    .into_iter()
    .filter_map(|c| match c {
      Call::Search(q) => Some(q),
      _ => None,
    })
    .collect();
  assert!(
    searches
      .iter()
      .all(|q| q.phone_equals.as_deref() == Some("+15551234567"))
  );
}

#[tokio::test]
async fn search_uses_present_fields_only() {
  let h = harness();
  let data = CreatePostData {
    guy_name: None,
    guy_phone: Some("  ".into()),
    guy_socials: Some("@tom_ig".into()),
    ..post()
  };
  h.service.add_post(&approved(), data).await;

  let first = h.store.calls().into_iter().next().unwrap();
  assert_eq!(
    first,
    Call::Search(GuyQuery::new().socials_contains("@tom_ig").limit(1))
  );
}

#[tokio::test]
async fn search_failure_falls_back_to_creating() {
  let h = harness();
  h.store.seed_guy(Some("Tom"), None, None);
  h.store.failures.lock().unwrap().search = true;

  let resp = h.service.add_post(&approved(), post()).await;
  assert!(resp.success);
  assert_eq!(h.store.writes(), vec![Call::InsertGuy, Call::InsertStory]);
}

#[tokio::test]
async fn guy_insert_failure_surfaces_storage_message() {
  let h = harness();
  h.store.failures.lock().unwrap().insert_guy = true;

  let resp = h.service.add_post(&approved(), post()).await;
  assert_eq!(error_of(&resp), "guys: permission denied");
  assert_eq!(h.store.writes(), vec![Call::InsertGuy]);
}

// ─── Story creation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn story_text_is_trimmed_and_fields_carried() {
  let h = harness();
  let caller = approved();
  let data = CreatePostData {
    image_url: Some("https://cdn.example/x.jpg".into()),
    tags: BTreeSet::from([Tag::Ghosting, Tag::RedFlag]),
    ..post()
  };

  let resp = h.service.add_post(&caller, data).await;
  let story = h.store.story(resp.post_id.unwrap());
  assert_eq!(story.text, "Ghosted me after three dates.");
  assert_eq!(story.tags, BTreeSet::from([Tag::RedFlag, Tag::Ghosting]));
  assert_eq!(story.image_url.as_deref(), Some("https://cdn.example/x.jpg"));
  assert_eq!(story.user_id, caller.unwrap().user_id);
}

#[tokio::test]
async fn anonymous_story_has_no_nickname() {
  let h = harness();
  let data = CreatePostData {
    anonymous: true,
    nickname: Some("visible-me".into()),
    ..post()
  };
  let resp = h.service.add_post(&approved(), data).await;
  let story = h.store.story(resp.post_id.unwrap());
  assert!(story.anonymous);
  assert_eq!(story.nickname, None);
}

#[tokio::test]
async fn nickname_defaults_to_callers() {
  let h = harness();
  let resp = h.service.add_post(&approved(), post()).await;
  let story = h.store.story(resp.post_id.unwrap());
  assert_eq!(story.nickname.as_deref(), Some("sweet-tea"));
}

#[tokio::test]
async fn supplied_nickname_wins() {
  let h = harness();
  let data = CreatePostData { nickname: Some("mystery".into()), ..post() };
  let resp = h.service.add_post(&approved(), data).await;
  let story = h.store.story(resp.post_id.unwrap());
  assert_eq!(story.nickname.as_deref(), Some("mystery"));
}

#[tokio::test]
async fn story_failure_removes_freshly_created_guy() {
  let h = harness();
  h.store.failures.lock().unwrap().insert_story = Some("stories: insert failed".into());

  let resp = h.service.add_post(&approved(), post()).await;
  assert_eq!(error_of(&resp), "stories: insert failed");

  let writes = h.store.writes();
  assert_eq!(writes.len(), 3);
  assert_eq!(writes[0], Call::InsertGuy);
  assert_eq!(writes[1], Call::InsertStory);
  assert!(matches!(writes[2], Call::DeleteGuy(_)));
  assert!(h.store.guys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn story_failure_keeps_reused_guy() {
  let h = harness();
  let existing = h.store.seed_guy(Some("Tom"), None, None);
  h.store.failures.lock().unwrap().insert_story = Some("boom".into());

  let resp = h.service.add_post(&approved(), post()).await;
  assert!(!resp.success);
  assert_eq!(h.store.writes(), vec![Call::InsertStory]);
  assert!(h.store.get_guy(existing.guy_id).await.unwrap().is_some());
}

#[tokio::test]
async fn blank_storage_error_uses_fallback() {
  let h = harness();
  h.store.failures.lock().unwrap().insert_story = Some(String::new());

  let resp = h.service.add_post(&approved(), post()).await;
  assert_eq!(error_of(&resp), STORAGE_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn typed_errors_available_to_callers() {
  let h = harness();
  let data = CreatePostData { tags: BTreeSet::new(), ..post() };
  let err = h.service.try_add_post(&approved(), data).await.unwrap_err();
  assert!(matches!(err, PostError::NoTags));
  assert!(err.is_validation());
}

#[test]
fn response_serializes_like_the_app_expects() {
  let ok = PostResponse {
    success: true,
    post_id: Some(Uuid::nil()),
    guy_id:  Some(Uuid::nil()),
    error:   None,
  };
  let json = serde_json::to_value(&ok).unwrap();
  assert_eq!(json["success"], true);
  assert!(json.get("postId").is_some());
  assert!(json.get("guyId").is_some());
  assert!(json.get("error").is_none());

  let data: CreatePostData = serde_json::from_str(
    r#"{"guyName":"Tom","storyText":"hi","tags":["red_flag"],"anonymous":true}"#,
  )
  .unwrap();
  assert_eq!(data.guy_name.as_deref(), Some("Tom"));
  assert!(data.anonymous);
}

// ─── Image upload ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_returns_public_url_with_unique_name() {
  let h = harness();
  let story_id = Uuid::new_v4();

  let url = h
    .service
    .upload_story_image(ImageSource::Bytes(vec![0xFF, 0xD8, 0xFF]), story_id)
    .await
    .unwrap();

  let millis = fixed_now().timestamp_millis();
  assert_eq!(
    url,
    format!("https://cdn.example/story-images/stories/story-{story_id}-{millis}.jpg")
  );
}

#[tokio::test]
async fn empty_image_is_not_uploaded() {
  let h = harness();
  let result = h
    .service
    .upload_story_image(ImageSource::Bytes(Vec::new()), Uuid::new_v4())
    .await;
  assert!(matches!(result, Err(UploadError::EmptyImage)));

  let url = h
    .service
    .upload_story_image_url(ImageSource::DataUri("data:image/jpeg;base64,".into()), Uuid::new_v4())
    .await;
  assert_eq!(url, None);
  assert_eq!(*h.objects.uploads.lock().unwrap(), 0);
}

#[tokio::test]
async fn same_generated_name_twice_is_a_collision() {
  let h = harness();
  let story_id = Uuid::new_v4();

  h.service
    .upload_story_image(ImageSource::Bytes(vec![1]), story_id)
    .await
    .unwrap();
  let second = h
    .service
    .upload_story_image(ImageSource::Bytes(vec![2]), story_id)
    .await;
  assert!(matches!(second, Err(UploadError::Collision(_))));

  let stored = h.objects.objects.lock().unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored.values().next().unwrap(), &vec![1]);
}

#[tokio::test]
async fn storage_failure_is_distinguishable_and_maps_to_none() {
  let h = harness_with(FakeObjects { offline: true, ..FakeObjects::default() });
  let story_id = Uuid::new_v4();

  let result = h
    .service
    .upload_story_image(ImageSource::Bytes(vec![1]), story_id)
    .await;
  assert!(matches!(result, Err(UploadError::Storage(_))));

  let url = h
    .service
    .upload_story_image_url(ImageSource::Bytes(vec![1]), story_id)
    .await;
  assert_eq!(url, None);
}

#[tokio::test]
async fn upload_reads_files_and_data_uris() {
  let h = harness();
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("photo.jpg");
  std::fs::write(&file, [9, 9, 9]).unwrap();

  let from_file = ImageSource::from_reference(&format!("file://{}", file.display()));
  h.service.upload_story_image(from_file, Uuid::new_v4()).await.unwrap();

  let from_data = ImageSource::from_reference("data:image/jpeg;base64,AAEC");
  h.service.upload_story_image(from_data, Uuid::new_v4()).await.unwrap();

  let mut stored: Vec<Vec<u8>> = h.objects.objects.lock().unwrap().values().cloned().collect();
  stored.sort();
  assert_eq!(stored, vec![vec![0, 1, 2], vec![9, 9, 9]]);
}

#[tokio::test]
async fn missing_file_is_a_read_error() {
  let h = harness();
  let result = h
    .service
    .upload_story_image(ImageSource::Path("/definitely/not/here.jpg".into()), Uuid::new_v4())
    .await;
  assert!(matches!(result, Err(UploadError::Read { .. })));
  assert_eq!(*h.objects.uploads.lock().unwrap(), 0);
}

#[tokio::test]
async fn attach_records_url_on_story() {
  let h = harness();
  let resp = h.service.add_post(&approved(), post()).await;
  let story_id = resp.post_id.unwrap();

  let url = h
    .service
    .upload_story_image(ImageSource::Bytes(vec![1]), story_id)
    .await
    .unwrap();
  let story = h
    .service
    .attach_story_image(story_id, url.clone())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(story.image_url, Some(url));
}
