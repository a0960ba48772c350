//! Integration tests for the remote operations of projects and profiles.

use sadstate_client::testing::{entity_json, entity_json_with, ScriptedTransport};
use sadstate_client::transport::TransportErrorKind;
use sadstate_client::{
    AuthTicket, CanonicalId, ClientError, EntityKind, Method, Outcome, PeerId, ProfileEdit,
    ProfilePermissions, Project, ProjectEdit, ProjectPermissions, RequiredPermission, Session,
};
use serde_json::{json, Map};
use std::sync::Arc;

fn setup() -> (Session, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let session = Session::with_transport("http://club.test", transport.clone());
    (session, transport)
}

fn fetch_project(session: &Session, transport: &ScriptedTransport, id: i64, name: &str) -> Project {
    transport.reply_json(200, &entity_json(id, name));
    session.get_project(name).into_result().expect("project fetch")
}

fn body_text(transport: &ScriptedTransport, index: usize) -> String {
    let request = &transport.requests()[index];
    String::from_utf8_lossy(request.body.as_deref().unwrap_or_default()).into_owned()
}

/// Status table with VIEW attached to 403.
#[test]
fn get_project_status_mapping() {
    let (session, transport) = setup();
    let view = RequiredPermission::from(ProjectPermissions::VIEW);

    transport.reply_json(200, &entity_json(1, "p"));
    transport.reply(400, "");
    transport.reply(403, "");
    transport.reply(404, "");
    transport.reply(500, "");

    let kinds: Vec<&str> = (0..5)
        .map(|_| session.get_project("p").outcome.kind())
        .collect();
    assert_eq!(
        kinds,
        vec!["success", "error", "invalid_permission", "not_found", "unexpected_error"]
    );

    transport.reply(403, "");
    assert_eq!(session.get_project("p").outcome, Outcome::InvalidPermission(view));
}

#[test]
fn malformed_success_body_is_transport_failure() {
    let (session, transport) = setup();
    transport.reply(200, "<html>oops</html>");
    transport.reply_json(200, &json!({"name": "no id"}));

    let response = session.get_project("p");
    assert!(matches!(
        response.outcome,
        Outcome::TransportFailure(ClientError::Decode(_))
    ));
    let response = session.get_project("p");
    assert!(matches!(
        response.outcome,
        Outcome::TransportFailure(ClientError::MalformedPayload { .. })
    ));
    assert_eq!(session.cache_len(EntityKind::Project), 0);
}

/// A permission entry for the anonymous peer (`0`) decodes like any other.
#[test]
fn anonymous_permission_entry_decodes() {
    let (session, transport) = setup();
    transport.reply_json(200, &entity_json_with(9, "public", &[(0, 4), (17, 63)]));

    let project = session.get_project("public").into_result().expect("fetch");

    assert_eq!(project.granted_to(PeerId::ANONYMOUS), ProjectPermissions::VIEW);
    let owner = AuthTicket::new(17).expect("non-zero");
    assert_eq!(project.granted_to(owner), ProjectPermissions::all());
}

#[test]
fn transport_failure_is_surfaced() {
    let (session, transport) = setup();
    transport.fail(TransportErrorKind::ConnectionRefused, "refused");

    let response = session.get_project("p");
    assert_eq!(response.status, None);
    assert!(matches!(
        response.outcome,
        Outcome::TransportFailure(ClientError::Transport(ref e)) if e.kind == TransportErrorKind::ConnectionRefused
    ));
}

#[test]
fn project_edit_applies_locally_on_success() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "old");
    let peer = AuthTicket::new(8).expect("non-zero");

    transport.reply(200, "");
    let edit = ProjectEdit::new()
        .rename("new")
        .grant(peer, ProjectPermissions::VIEW | ProjectPermissions::EDIT);
    project.edit(&edit).into_result().expect("edit");

    assert_eq!(project.name(), "new");
    assert_eq!(
        project.granted_to(peer),
        ProjectPermissions::VIEW | ProjectPermissions::EDIT
    );
    let body = body_text(&transport, 1);
    assert!(body.contains("name=\"name\"\r\n\r\nold\r\n"));
    assert!(body.contains(r#""name":"new""#));
}

#[test]
fn project_edit_denied_leaves_state() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "old");

    transport.reply(403, "");
    let response = project.edit(&ProjectEdit::new().rename("new"));

    assert_eq!(
        response.outcome,
        Outcome::InvalidPermission(ProjectPermissions::EDIT.into())
    );
    assert_eq!(project.name(), "old");
}

#[test]
fn project_delete_evicts() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 4, "doomed");

    transport.reply(200, "");
    project.delete().into_result().expect("delete");

    let request = &transport.requests()[1];
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.url, "http://club.test/project/delete?name=doomed");
    assert!(session.cached_project(CanonicalId::new(4)).is_none());

    transport.reply(403, "");
    assert_eq!(
        project.delete().outcome,
        Outcome::InvalidPermission(ProjectPermissions::DELETE.into())
    );
}

#[test]
fn get_profile_goes_through_cache() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");

    transport.reply_json(200, &entity_json(50, "alice"));
    transport.reply_json(200, &entity_json(50, "alice"));
    let a = project.get_profile("alice").into_result().expect("first");
    let b = project.get_profile("alice").into_result().expect("second");

    assert!(a.same_entity(&b));
    assert!(a.project().same_entity(&project));
    assert_eq!(session.cache_len(EntityKind::Profile), 1);
    assert_eq!(
        transport.requests()[1].url,
        "http://club.test/project/profile/get?name=club&profile_name=alice"
    );
}

#[test]
fn get_all_profiles_interns_each() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");

    transport.reply_json(200, &entity_json(50, "alice"));
    let alice = project.get_profile("alice").into_result().expect("alice");

    transport.reply_json(
        200,
        &json!([entity_json(50, "alice"), entity_json(51, "bob")]),
    );
    let all = project.get_all_profiles().into_result().expect("all");

    assert_eq!(all.len(), 2);
    assert!(all[0].same_entity(&alice));
    assert_eq!(all[1].name(), "bob");
    assert_eq!(session.cache_len(EntityKind::Profile), 2);
    assert_eq!(
        transport.requests()[2].url,
        "http://club.test/project/profile/all?name=club"
    );

    transport.reply_json(200, &json!({"not": "an array"}));
    assert!(matches!(
        project.get_all_profiles().outcome,
        Outcome::TransportFailure(ClientError::Decode(_))
    ));
}

#[test]
fn add_and_remove_profile() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");

    transport.reply(200, "");
    project
        .add_profile("carol", None, Map::new())
        .into_result()
        .expect("add");
    let body = body_text(&transport, 1);
    assert!(body.contains("name=\"profile_name\"\r\n\r\ncarol\r\n"));
    assert!(body.contains(r#""permissions":null"#));

    transport.reply(403, "");
    assert_eq!(
        project.add_profile("dave", None, Map::new()).outcome,
        Outcome::InvalidPermission(ProjectPermissions::ADD_PROFILE.into())
    );

    transport.reply(403, "");
    assert_eq!(
        project.remove_profile("carol").outcome,
        Outcome::InvalidPermission(ProjectPermissions::REMOVE_PROFILE.into())
    );
    let request = &transport.requests()[3];
    assert_eq!(request.method, Method::Post);
    assert_eq!(
        request.url,
        "http://club.test/project/profile/remove?name=club&profile_name=carol"
    );
}

#[test]
fn profile_remove_evicts_on_success_or_not_found() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(60, "erin"));
    transport.reply_json(200, &entity_json(61, "frank"));
    let erin = project.get_profile("erin").into_result().expect("erin");
    let frank = project.get_profile("frank").into_result().expect("frank");

    transport.reply(500, "");
    erin.remove();
    assert!(session.cached_profile(CanonicalId::new(60)).is_some());

    transport.reply(200, "");
    erin.remove().into_result().expect("remove");
    assert!(session.cached_profile(CanonicalId::new(60)).is_none());

    transport.reply(404, "");
    assert_eq!(frank.remove().outcome, Outcome::NotFound);
    assert!(session.cached_profile(CanonicalId::new(61)).is_none());
}

#[test]
fn profile_refresh_drift() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(70, "gina"));
    let gina = project.get_profile("gina").into_result().expect("gina");

    transport.reply_json(200, &entity_json(71, "gina"));
    let response = gina.refresh();

    assert_eq!(response.outcome.kind(), "identity_drift");
    assert!(session.cached_profile(CanonicalId::new(70)).is_none());
    assert_eq!(gina.id(), CanonicalId::new(70));
}

#[test]
fn profile_refresh_merges_permissions() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(70, "gina"));
    let gina = project.get_profile("gina").into_result().expect("gina");

    transport.reply_json(200, &entity_json_with(70, "gina", &[(3, 0b011)]));
    gina.refresh().into_result().expect("refresh");

    let peer = AuthTicket::new(3).expect("non-zero");
    assert_eq!(
        gina.granted_to(peer),
        ProfilePermissions::READ | ProfilePermissions::WRITE
    );
}

#[test]
fn profile_read_returns_raw_bytes() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(80, "hal"));
    let hal = project.get_profile("hal").into_result().expect("hal");

    transport.reply(200, vec![0u8, 159, 146, 150]);
    assert_eq!(hal.read().into_result(), Ok(vec![0u8, 159, 146, 150]));

    transport.reply(403, "");
    assert_eq!(
        hal.read().outcome,
        Outcome::InvalidPermission(ProfilePermissions::READ.into())
    );
}

#[test]
fn profile_write_and_append() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(80, "hal"));
    let hal = project.get_profile("hal").into_result().expect("hal");

    transport.reply(200, "4090");
    assert_eq!(hal.write(b"hello!").into_result(), Ok(4090));
    transport.reply(200, "4085");
    assert_eq!(hal.append(b"world").into_result(), Ok(4085));

    let requests = transport.requests();
    assert!(requests[2].url.ends_with("/project/profile/write"));
    assert!(requests[3].url.ends_with("/project/profile/append"));
    let body = body_text(&transport, 2);
    assert!(body.contains("filename=\"data\""));
    assert!(body.contains("hello!"));

    transport.reply(403, "");
    assert_eq!(
        hal.write(b"x").outcome,
        Outcome::InvalidPermission(ProfilePermissions::WRITE.into())
    );
}

#[test]
fn profile_edit_posts_to_project_edit() {
    let (session, transport) = setup();
    let project = fetch_project(&session, &transport, 1, "club");
    transport.reply_json(200, &entity_json(90, "ivy"));
    let ivy = project.get_profile("ivy").into_result().expect("ivy");

    transport.reply(200, "");
    ivy.edit(&ProfileEdit::new().rename("ivy2"))
        .into_result()
        .expect("edit");

    assert_eq!(ivy.name(), "ivy2");
    assert!(transport.requests()[2].url.ends_with("/project/edit"));
    let body = body_text(&transport, 2);
    assert!(body.contains("name=\"profile_name\"\r\n\r\nivy\r\n"));

    transport.reply(403, "");
    assert_eq!(
        ivy.edit(&ProfileEdit::new()).outcome,
        Outcome::InvalidPermission(ProjectPermissions::EDIT_PROFILE.into())
    );
}
