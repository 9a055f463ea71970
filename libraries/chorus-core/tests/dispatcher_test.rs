//! Chat command dispatch: parsing, permissions and replies

mod common;

use chorus_core::{
    AccessLevel, Directive, Dispatcher, PermissionCheck, PlaybackState, PlaylistRequest,
    SessionSettings, Transport, UrlMatcher,
};
use common::Harness;
use mockall::{mock, predicate::eq};
use std::sync::Arc;

const TRACK_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLabc123";

fn settings() -> SessionSettings {
    SessionSettings {
        admins: vec!["root".to_string()],
        ..SessionSettings::default()
    }
}

fn dispatcher(h: &Harness, settings: &SessionSettings) -> Dispatcher {
    Dispatcher::new(
        settings,
        UrlMatcher::default(),
        Arc::clone(&h.transport) as Arc<dyn Transport>,
    )
}

#[test]
fn plain_chat_is_ignored() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    let directive = d.handle(&mut h.coordinator, "alice", "hello there").unwrap();

    assert!(directive.is_none());
    assert!(h.transport.whispers_to("alice").is_empty());
    assert!(h.transport.broadcasts().is_empty());
}

#[test]
fn unknown_command_gets_reply() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "alice", "!dance").unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["The command you entered does not exist.".to_string()]
    );
}

#[test]
fn add_track_to_idle_session_fetches() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", TRACK_URL))
        .unwrap();

    match directive {
        Some(Directive::Fetch(request)) => assert_eq!(request.track_id, "dQw4w9WgXcQ"),
        other => panic!("expected fetch, got {:?}", other),
    }
    assert_eq!(h.coordinator.state(), PlaybackState::Fetching);
}

#[test]
fn add_accepts_url_wrapped_in_markup() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    let message = format!("!add <a href=\"{0}\">{0}</a>", TRACK_URL);
    let directive = d.handle(&mut h.coordinator, "alice", &message).unwrap();

    assert!(matches!(directive, Some(Directive::Fetch(_))));
}

#[test]
fn add_without_argument_is_rejected() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "alice", "!add").unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["The command you issued requires an argument.".to_string()]
    );
    assert!(h.coordinator.queue().is_empty());
}

#[test]
fn add_with_unknown_url_is_rejected() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "alice", "!add https://example.com/song")
        .unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["The URL you submitted does not match a known format.".to_string()]
    );
    assert_eq!(h.coordinator.state(), PlaybackState::Idle);
}

#[test]
fn add_playlist_requests_resolution() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", PLAYLIST_URL))
        .unwrap();

    assert_eq!(
        directive,
        Some(Directive::ResolvePlaylist(PlaylistRequest {
            submitter: "alice".to_string(),
            playlist_id: "PLabc123".to_string(),
            generation: 0,
        }))
    );
    // Nothing is queued until the playlist resolves
    assert!(h.coordinator.queue().is_empty());
}

#[test]
fn playlist_permission_is_separate_from_add() {
    let mut h = Harness::new(3);
    let mut s = settings();
    s.access.admin_add_playlists = true;
    let d = dispatcher(&h, &s);

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", PLAYLIST_URL))
        .unwrap();
    assert!(directive.is_none());
    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["You do not have permission to add playlists.".to_string()]
    );

    let directive = d
        .handle(&mut h.coordinator, "root", &format!("!add {}", PLAYLIST_URL))
        .unwrap();
    assert!(matches!(directive, Some(Directive::ResolvePlaylist(_))));
}

#[test]
fn admin_commands_need_admin() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    for command in ["!reset", "!kill", "!reload", "!move Music", "!forceskip"] {
        let directive = d.handle(&mut h.coordinator, "alice", command).unwrap();
        assert!(directive.is_none(), "{} should be denied", command);
    }

    let replies = h.transport.whispers_to("alice");
    assert_eq!(replies.len(), 5);
    assert!(replies
        .iter()
        .all(|r| r == "You do not have permission to use that command."));
    assert!(h.transport.moves().is_empty());
    assert_eq!(h.cache.purge_count(), 0);
}

#[test]
fn forceskip_stays_admin_only_when_skip_is_open() {
    let mut h = Harness::new(3);
    let mut s = settings();
    s.access.admin_skip = false;
    let d = dispatcher(&h, &s);
    h.add_track("bob", "one");

    d.handle(&mut h.coordinator, "alice", "!forceskip").unwrap();

    assert_eq!(h.coordinator.state(), PlaybackState::Playing);
}

#[test]
fn admin_can_force_skip() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());
    h.add_track("bob", "one");

    d.handle(&mut h.coordinator, "root", "!forceskip").unwrap();

    assert_eq!(h.coordinator.state(), PlaybackState::Stopping);
}

#[test]
fn skip_reports_nothing_playing() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "alice", "!skip").unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["There is no audio playing at the moment.".to_string()]
    );
}

#[test]
fn second_vote_is_reported() {
    let mut h = Harness::new(10);
    let d = dispatcher(&h, &settings());
    h.add_track("bob", "one");

    d.handle(&mut h.coordinator, "alice", "!skip").unwrap();
    d.handle(&mut h.coordinator, "alice", "!skip").unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["You have already voted to skip this.".to_string()]
    );
}

#[test]
fn volume_out_of_range_reply() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "alice", "!volume 2").unwrap();

    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["The volume you supplied is not in the allowed range (0.01 - 0.80).".to_string()]
    );
}

#[test]
fn move_checks_channel_exists() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    d.handle(&mut h.coordinator, "root", "!move Nowhere").unwrap();
    assert!(h.transport.moves().is_empty());
    assert_eq!(
        h.transport.whispers_to("root"),
        vec!["The channel you specified does not exist.".to_string()]
    );

    d.handle(&mut h.coordinator, "root", "!move Music").unwrap();
    assert_eq!(h.transport.moves(), vec!["Music".to_string()]);
}

#[test]
fn failed_move_is_reported() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());
    h.transport.fail_move();

    let directive = d.handle(&mut h.coordinator, "root", "!move Music").unwrap();

    assert!(directive.is_none());
    assert_eq!(
        h.transport.whispers_to("root"),
        vec!["The bot could not move to the channel Music.".to_string()]
    );
}

#[test]
fn playlist_request_after_reset_carries_new_generation() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());
    d.handle(&mut h.coordinator, "root", "!reset").unwrap();

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", PLAYLIST_URL))
        .unwrap();

    match directive {
        Some(Directive::ResolvePlaylist(request)) => {
            assert_eq!(request.generation, 1);
            assert!(h.coordinator.accepts_playlist(&request));
        }
        other => panic!("expected playlist resolution, got {:?}", other),
    }
}

#[test]
fn reload_and_kill_become_directives() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());

    assert_eq!(
        d.handle(&mut h.coordinator, "root", "!reload").unwrap(),
        Some(Directive::Reload {
            requester: "root".to_string()
        })
    );
    assert_eq!(
        d.handle(&mut h.coordinator, "root", "!kill").unwrap(),
        Some(Directive::Shutdown)
    );
    assert_eq!(h.cache.purge_count(), 1);
}

#[test]
fn fatal_errors_propagate() {
    let mut h = Harness::new(3);
    let d = dispatcher(&h, &settings());
    h.cache.fail_purge();

    let err = d.handle(&mut h.coordinator, "root", "!reset").unwrap_err();

    assert!(err.is_fatal());
    assert!(h.transport.whispers_to("root").is_empty());
}

#[test]
fn custom_aliases_and_prefix() {
    let mut h = Harness::new(3);
    let mut s = settings();
    s.commands.prefix = "#".to_string();
    s.commands.aliases.add = "play".to_string();
    let d = dispatcher(&h, &s);

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("#play {}", TRACK_URL))
        .unwrap();
    assert!(matches!(directive, Some(Directive::Fetch(_))));

    // The old keyword and prefix are plain chat or unknown now
    assert!(d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", TRACK_URL))
        .unwrap()
        .is_none());
    d.handle(&mut h.coordinator, "alice", "#add x").unwrap();
    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["The command you entered does not exist.".to_string()]
    );
}

mock! {
    pub Permissions {}

    impl PermissionCheck for Permissions {
        fn has_permission(&self, participant: &str, required: AccessLevel) -> bool;
    }
}

#[test]
fn permission_lookup_is_pluggable() {
    let mut h = Harness::new(3);
    let mut permissions = MockPermissions::new();
    permissions
        .expect_has_permission()
        .with(eq("alice"), eq(AccessLevel::Admin))
        .times(1)
        .return_const(true);
    let d = dispatcher(&h, &settings()).with_permissions(Arc::new(permissions));

    d.handle(&mut h.coordinator, "alice", "!move Music").unwrap();

    assert_eq!(h.transport.moves(), vec!["Music".to_string()]);
}

#[test]
fn playlist_add_checks_both_levels() {
    let mut h = Harness::new(3);
    let mut s = settings();
    s.access.admin_add_playlists = true;

    let mut permissions = MockPermissions::new();
    permissions
        .expect_has_permission()
        .with(eq("alice"), eq(AccessLevel::Everyone))
        .times(1)
        .return_const(true);
    permissions
        .expect_has_permission()
        .with(eq("alice"), eq(AccessLevel::Admin))
        .times(1)
        .return_const(false);
    let d = dispatcher(&h, &s).with_permissions(Arc::new(permissions));

    let directive = d
        .handle(&mut h.coordinator, "alice", &format!("!add {}", PLAYLIST_URL))
        .unwrap();

    assert!(directive.is_none());
    assert_eq!(
        h.transport.whispers_to("alice"),
        vec!["You do not have permission to add playlists.".to_string()]
    );
}

#[test]
fn reload_keeps_external_permission_lookup() {
    let mut h = Harness::new(3);
    let mut permissions = MockPermissions::new();
    permissions
        .expect_has_permission()
        .with(eq("alice"), eq(AccessLevel::Admin))
        .times(1)
        .return_const(true);
    let mut d = dispatcher(&h, &settings()).with_permissions(Arc::new(permissions));

    // New settings name a different admin; the external lookup still decides
    d.apply_settings(&SessionSettings {
        admins: vec!["someone-else".to_string()],
        ..SessionSettings::default()
    });
    d.handle(&mut h.coordinator, "alice", "!move Lobby").unwrap();

    assert_eq!(h.transport.moves(), vec!["Lobby".to_string()]);
    assert!(h.transport.whispers_to("alice").is_empty());
}

#[test]
fn reload_replaces_configured_admins() {
    let mut h = Harness::new(3);
    let mut d = dispatcher(&h, &settings());

    d.apply_settings(&SessionSettings {
        admins: vec!["alice".to_string()],
        ..SessionSettings::default()
    });
    d.handle(&mut h.coordinator, "alice", "!move Lobby").unwrap();
    d.handle(&mut h.coordinator, "root", "!move Music").unwrap();

    assert_eq!(h.transport.moves(), vec!["Lobby".to_string()]);
    assert_eq!(
        h.transport.whispers_to("root"),
        vec!["You do not have permission to use that command.".to_string()]
    );
}
