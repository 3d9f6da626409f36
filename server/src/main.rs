use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use holdout_server::ServerPlugin;
use std::time::Duration;

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(16))))
        .add_plugins(bevy::log::LogPlugin::default())
        .add_plugins(bevy::state::app::StatesPlugin)
        .add_plugins(ServerPlugin { listen: true })
        .run();
}
