use bevy::prelude::*;
use holdout_client::ClientPlugin;

fn main() {
    let Some(server) = std::env::args().nth(1) else {
        eprintln!("usage: holdout-client <server-url>");
        std::process::exit(2);
    };
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                fit_canvas_to_parent: true,
                title: "Holdout- Client Only".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ClientPlugin {
            server: Some(server),
        })
        .run();
}
