#![allow(dead_code)]

pub mod fakes;

use bb2gitea::types::{
    CloneLink, GroupGrant, PermissionLevel, SourceProject, SourceRepository, SourceUser, UserGrant,
};

pub use fakes::{FakeSource, FakeTarget};

pub const SVC_HTTP_URL: &str = "https://bitbucket.example.com/scm/eng/svc.git";
pub const SVC_SSH_URL: &str = "ssh://git@bitbucket.example.com:7999/eng/svc.git";

pub fn user(name: &str) -> SourceUser {
    SourceUser {
        username: name.to_string(),
        display_name: format!("{name} display"),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

pub fn direct(name: &str, level: PermissionLevel) -> UserGrant {
    UserGrant {
        user: user(name),
        level,
    }
}

pub fn group(name: &str, level: PermissionLevel) -> GroupGrant {
    GroupGrant {
        group: name.to_string(),
        level,
    }
}

/// Project `ENG` (public, "Engineering") granting alice WRITE directly and
/// group `eng-team` {bob, carol} ADMIN; repository `svc` granting bob READ.
pub fn scenario() -> FakeSource {
    let mut source = FakeSource::default();
    source.add_project(SourceProject {
        key: "ENG".to_string(),
        name: "ENG".to_string(),
        description: "Engineering".to_string(),
        public: true,
    });
    source.add_repo(
        "ENG",
        SourceRepository {
            slug: "svc".to_string(),
            name: "svc".to_string(),
            description: "Service".to_string(),
            public: true,
            clone_links: vec![
                CloneLink {
                    protocol: "ssh".to_string(),
                    url: SVC_SSH_URL.to_string(),
                },
                CloneLink {
                    protocol: "http".to_string(),
                    url: SVC_HTTP_URL.to_string(),
                },
            ],
        },
    );
    source.add_group("eng-team", &["bob", "carol"]);
    source.grant_project_user("ENG", direct("alice", PermissionLevel::Write));
    source.grant_project_group("ENG", group("eng-team", PermissionLevel::Admin));
    source.grant_repo_user("ENG", "svc", direct("bob", PermissionLevel::Read));
    source
}
