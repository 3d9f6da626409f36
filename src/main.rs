use bevy::prelude::*;
use holdout::CombinedPlugin;
use holdout_client::ClientPlugin;
use holdout_server::ServerPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                fit_canvas_to_parent: true,
                title: "Holdout".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ServerPlugin::default())
        .add_plugins(ClientPlugin::default())
        .add_plugins(CombinedPlugin)
        .run();
}
