use super::*;
use etcetera::*;
use std::io;
use std::path::PathBuf;

fn path() -> io::Result<PathBuf> {
    match choose_app_strategy(AppStrategyArgs {
        top_level_domain: "com".to_string(),
        author: "tbd".to_string(),
        app_name: "Holdout".to_string(),
    }) {
        Ok(strat) => {
            let mut path = strat.data_dir();
            path.push("settings.toml");
            Ok(path)
        }
        Err(err) => {
            error!(%err, "Couldn't locate home directory");
            Err(io::Error::other("Couldn't locate home directory"))
        }
    }
}

/// Load settings and keybinds, then write the completed file back so the
/// user has something to edit. Any failure falls through to defaults; the
/// character must stay playable with no settings file at all.
pub fn load_config(mut commands: Commands) {
    let mut loaded: Option<(ClientSettings, InputMap<Action>)> = None;
    let mut needs_write = true;
    let path = path().ok();
    if let Some(path) = &path {
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(%err, "Couldn't create the settings directory");
            }
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match parse_settings(&data) {
                Ok(partial) => {
                    needs_write = partial
                        .settings
                        .as_ref()
                        .is_none_or(PartialClientSettings::is_incomplete)
                        || partial.input.is_none();
                    loaded = Some((
                        partial
                            .settings
                            .map_or_else(ClientSettings::default, ClientSettings::from),
                        partial.input.unwrap_or_default(),
                    ));
                }
                Err(err) => {
                    error!(%err, "Invalid data in settings file, discarding stored bindings");
                }
            },
            Err(err) => {
                warn!(%err, "Failed to load settings from file");
            }
        }
    }
    let (settings, mut input) = loaded.unwrap_or_default();
    needs_write |= fill_keybinds(&mut input);
    if needs_write {
        if let Some(path) = &path {
            info!(?path, "Saving settings");
            match toml::to_string_pretty(&SerializeShim {
                settings: &settings,
                input: &input,
            }) {
                Ok(data) => {
                    if let Err(err) = std::fs::write(path, data) {
                        error!(%err, "Failed to save settings");
                    }
                }
                Err(err) => {
                    error!(%err, "Failed to serialize settings");
                }
            }
        }
    }
    commands.insert_resource(settings);
    commands.insert_resource(input);
}
