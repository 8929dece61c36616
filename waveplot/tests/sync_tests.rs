//! Registry sync tests against the in-memory registry

mod helpers;

use helpers::fake_registry::{Mode, BASE_URL};
use helpers::{generate_test_wav, AudioConfig, FakeRegistry};
use tempfile::TempDir;
use uuid::Uuid;
use waveplot::{decode, Error, LinkContext, Registration, RegistryClient, WavePlot};

const EDITOR: &str = "editor-key-1";
const OTHER_EDITOR: &str = "editor-key-2";

fn generated(dir: &TempDir, name: &str, config: &AudioConfig) -> WavePlot {
    let path = generate_test_wav(&dir.path().join(name), config).unwrap();
    let mut waveplot = WavePlot::new();
    waveplot.generate(decode::init(), &path).unwrap();
    waveplot
}

fn context() -> LinkContext {
    LinkContext {
        release_gid: Uuid::new_v4(),
        recording_gid: Uuid::new_v4(),
        track_gid: Uuid::new_v4(),
        artist_credit_id: 1234,
    }
}

#[test]
fn test_register_then_retrieve_round_trip() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut local = generated(&dir, "a.wav", &AudioConfig::default());
    local.generate_thumbnail().unwrap();
    let registration = local.upload(&client, EDITOR).unwrap();

    let gid = match registration {
        Registration::Created(gid) => gid,
        other => panic!("expected Created, got {:?}", other),
    };
    assert_eq!(local.gid(), Some(gid));
    assert_eq!(local.image_hash(), Some(local.content_hash().unwrap().as_str()));

    let mut remote = WavePlot::new();
    remote.get(&client, gid).unwrap();

    assert_eq!(remote.gid(), Some(gid));
    assert_eq!(remote.full(), local.full());
    assert_eq!(remote.content_hash().unwrap(), local.content_hash().unwrap());
    assert_eq!(remote.thumbnail(), local.thumbnail());
    assert_eq!(remote.sonic_hash(), Some(local.clone().generate_sonic_hash().unwrap()));
    assert_eq!(remote.waveform().unwrap().info(), local.waveform().unwrap().info());
    assert!(remote.path().is_none());

    // Preview derives from the retrieved waveform exactly as from the local one
    assert_eq!(
        remote.generate_preview().unwrap(),
        local.generate_preview().unwrap()
    );
}

#[test]
fn test_duplicate_content_yields_existing_identifier() {
    let registry = FakeRegistry::new(&[EDITOR, OTHER_EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut first = generated(&dir, "first.wav", &AudioConfig::default());
    let mut second = generated(&dir, "second.wav", &AudioConfig::default());

    let created = first.upload(&client, EDITOR).unwrap();
    let duplicate = second.upload(&client, OTHER_EDITOR).unwrap();

    assert!(matches!(created, Registration::Created(_)));
    assert_eq!(duplicate, Registration::Duplicate(created.gid().unwrap()));
    assert_eq!(second.gid(), first.gid());
    assert_eq!(registry.stored_count(), 1);
}

#[test]
fn test_different_content_gets_distinct_identifiers() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut loud = generated(&dir, "loud.wav", &AudioConfig::default());
    let mut quiet = generated(
        &dir,
        "quiet.wav",
        &AudioConfig {
            amplitude: 0.1,
            ..AudioConfig::default()
        },
    );

    let a = loud.upload(&client, EDITOR).unwrap().into_result().unwrap();
    let b = quiet.upload(&client, EDITOR).unwrap().into_result().unwrap();

    assert_ne!(a, b);
    assert_eq!(registry.stored_count(), 2);
}

#[test]
fn test_unknown_editor_is_rejected() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    let outcome = waveplot.upload(&client, "not-an-editor").unwrap();

    assert_eq!(
        outcome,
        Registration::Rejected {
            status: 401,
            message: "Editor key not recognised".to_string()
        }
    );
    assert!(waveplot.gid().is_none());
    assert!(matches!(
        outcome.into_result(),
        Err(Error::Rejected { status: 401, .. })
    ));
}

#[test]
fn test_malformed_registration_response_leaves_entity_unchanged() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    let before = waveplot.clone();

    registry.set_mode(Mode::Garbage);
    let result = waveplot.upload(&client, EDITOR);

    assert!(matches!(result, Err(Error::ProtocolError { operation: "register", .. })));
    assert_eq!(waveplot, before);
    assert!(waveplot.gid().is_none());
}

#[test]
fn test_malformed_retrieve_response() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    registry.set_mode(Mode::Garbage);

    let mut waveplot = WavePlot::new();
    let result = waveplot.get(&client, Uuid::new_v4());

    assert!(matches!(result, Err(Error::ProtocolError { operation: "retrieve", .. })));
    assert_eq!(waveplot, WavePlot::new());
}

#[test]
fn test_retrieve_unknown_identifier() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);

    let result = client.retrieve(Uuid::new_v4());
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_unreachable_registry_is_transport_error() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();
    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());

    registry.set_mode(Mode::Unreachable);
    let result = waveplot.upload(&client, EDITOR);

    assert!(matches!(result, Err(Error::TransportError { operation: "register", .. })));
    assert!(waveplot.gid().is_none());
}

#[test]
fn test_registered_waveplot_cannot_register_again() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    waveplot.upload(&client, EDITOR).unwrap();
    let requests = registry.request_count();

    let result = waveplot.upload(&client, EDITOR);
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
    assert_eq!(registry.request_count(), requests);
}

#[test]
fn test_link_registered_waveplot() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    let gid = waveplot.upload(&client, EDITOR).unwrap().into_result().unwrap();
    let context = context();

    waveplot.link(&client, &context).unwrap();

    let links = registry.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].waveplot_uuid, gid);
    assert_eq!(links[0].context, context);
}

#[test]
fn test_link_unknown_waveplot_is_rejected() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let other = FakeRegistry::new(&[EDITOR]);
    let dir = TempDir::new().unwrap();

    // Registered with one registry, linked against another that never saw it
    let mut waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    waveplot
        .upload(&RegistryClient::with_transport(BASE_URL, &other), EDITOR)
        .unwrap();

    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let result = waveplot.link(&client, &context());

    assert!(matches!(
        result,
        Err(Error::Rejected { operation: "link", status: 404, .. })
    ));
    assert!(registry.links().is_empty());
}

#[test]
fn test_link_requires_identifier() {
    let registry = FakeRegistry::new(&[EDITOR]);
    let client = RegistryClient::with_transport(BASE_URL, &registry);
    let dir = TempDir::new().unwrap();

    let waveplot = generated(&dir, "a.wav", &AudioConfig::default());
    let result = waveplot.link(&client, &context());

    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
    assert_eq!(registry.request_count(), 0);
}
