//! Records and the recognition workflow against an on-disk store.

use chrono::Utc;
use hospnav::config::RecognitionConfig;
use hospnav::recognition::{Camera, CaptureState, CapturedImage, FileCamera};
use hospnav::records::family::{default_member, delete_family_member, upsert_family_member};
use hospnav::records::medication::load_medications;
use hospnav::records::recognition::append_recognition;
use hospnav::records::{FamilyMember, FamilyMemberForm, Record, Relation};
use hospnav::{
    CaptureSession, Error, KeyValueStore, MedicationRecognition, RecordStore, SampleRecognizer,
    SqliteStore,
};

fn form(name: &str, relation: Relation, is_default: bool) -> FamilyMemberForm {
    FamilyMemberForm {
        name: name.to_string(),
        relation: Some(relation),
        is_default,
        ..FamilyMemberForm::default()
    }
}

#[test]
fn test_family_members_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("local_storage.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        let records = RecordStore::new(&store);

        let members = upsert_family_member(Vec::new(), FamilyMemberForm::self_profile("Wang Fang")).unwrap();
        let members = upsert_family_member(members, form("Wang Lei", Relation::Child, false)).unwrap();
        let members = upsert_family_member(members, form("Zhao Min", Relation::Spouse, true)).unwrap();
        records.save(&members).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let members: Vec<FamilyMember> = RecordStore::new(&store).load().unwrap();
    assert_eq!(members.len(), 3);
    assert!(members[0].is_self());
    assert_eq!(members.iter().filter(|m| m.is_default).count(), 1);
    assert_eq!(default_member(&members).unwrap().name, "Zhao Min");
}

#[test]
fn test_deleting_default_member_promotes_first() {
    let store = SqliteStore::open_in_memory().unwrap();
    let records = RecordStore::new(&store);

    let members = upsert_family_member(Vec::new(), FamilyMemberForm::self_profile("Li Na")).unwrap();
    let members = upsert_family_member(members, form("Li Qiang", Relation::Parent, true)).unwrap();
    let parent_id = members[1].id.clone();
    records.save(&members).unwrap();

    let members = delete_family_member(records.load().unwrap(), &parent_id).unwrap();
    records.save(&members).unwrap();

    let members: Vec<FamilyMember> = records.load().unwrap();
    assert_eq!(members.len(), 1);
    assert!(members[0].is_default);
}

#[test]
fn test_corrupt_value_reads_as_empty() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set(FamilyMember::KEY, "[{\"id\": ").unwrap();

    let records = RecordStore::new(&store);
    assert!(records.load::<FamilyMember>().unwrap().is_empty());
}

#[test]
fn test_quota_rejects_write_and_keeps_previous_value() {
    let store = SqliteStore::open_in_memory().unwrap().with_quota(Some(600));
    let records = RecordStore::new(&store);

    let image = "data:image/jpeg;base64,".to_string() + &"A".repeat(200);
    let first = MedicationRecognition::new(
        &[],
        Utc::now(),
        image.clone(),
        "med-1".to_string(),
        "Aspirin".to_string(),
        true,
        90,
    );
    let history = append_recognition(Vec::new(), first);
    records.save(&history).unwrap();

    let second = MedicationRecognition::new(
        &history,
        Utc::now(),
        image.clone() + &image,
        "med-2".to_string(),
        "Metformin".to_string(),
        false,
        75,
    );
    let bigger = append_recognition(history.clone(), second);
    let err = records.save(&bigger).unwrap_err();
    assert!(matches!(err, Error::StorageQuota { .. }));
    assert_eq!(err.user_message(), "Could not save, please try again.");

    assert_eq!(records.load::<MedicationRecognition>().unwrap(), history);
}

#[tokio::test]
async fn test_photo_to_history_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("box.jpg");
    std::fs::write(&image_path, b"\xff\xd8\xff\xe0jpeg").unwrap();

    let store = SqliteStore::open(dir.path().join("local_storage.db")).unwrap();
    let records = RecordStore::new(&store);
    let config = RecognitionConfig {
        delay_ms: 0,
        ..RecognitionConfig::default()
    };
    let recognizer = SampleRecognizer::new(load_medications(&records).unwrap(), &config).unwrap().with_seed(11);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut session = CaptureSession::new(FileCamera::new(&image_path));
        session.start().unwrap();
        let image: CapturedImage = session.take_snapshot().unwrap().clone();
        assert!(image.data_url.starts_with("data:image/jpeg;base64,"));
        assert!(!session.camera().is_active());

        let record = session.recognize(&recognizer, &records).await.unwrap();
        assert!((70..=99).contains(&record.confidence));
        assert_eq!(record.image_url, image.data_url);
        assert!(matches!(session.state(), CaptureState::Done(_)));
        ids.push(record.id);
    }

    let history: Vec<MedicationRecognition> = records.load().unwrap();
    let stored: Vec<_> = history.iter().map(|r| r.id.clone()).collect();
    ids.reverse();
    assert_eq!(stored, ids);

    let cleared: Vec<MedicationRecognition> = records.clear().unwrap();
    assert!(cleared.is_empty());
    assert!(records.load::<MedicationRecognition>().unwrap().is_empty());
}

#[test]
fn test_missing_camera_image_is_device_unavailable() {
    let mut session = CaptureSession::new(FileCamera::new("/nonexistent/box.jpg"));
    let err = session.start().unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable { device: "camera", .. }));
    assert_eq!(session.state(), &CaptureState::Idle);
}
