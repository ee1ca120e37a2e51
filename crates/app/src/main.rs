use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{Root, ThemeRegistry};

use nutrilens::app::{NutriLensShell, Quit, ToggleSettings, default_themes_path};
use nutrilens::assistant::bind_keys;
use nutrilens::settings::state::{SettingsState, SettingsStore};

fn main() {
    tracing_subscriber::fmt::init();

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(|cx| {
        gpui_tokio_bridge::init(cx);
        gpui_component::init(cx);

        // Themes are optional; built-in themes apply when the directory is missing.
        if let Err(err) = ThemeRegistry::watch_dir(default_themes_path(), cx, |cx| {
            SettingsStore::load().settings().apply_theme(None, cx);
            tracing::info!("theme directory watch initialized");
        }) {
            tracing::warn!(error = %err, "failed to watch themes directory, using default themes");
            SettingsStore::load().settings().apply_theme(None, cx);
        }

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("ctrl-q", Quit, None),
            KeyBinding::new("cmd-,", ToggleSettings, None),
            KeyBinding::new("ctrl-,", ToggleSettings, None),
        ]);
        bind_keys(cx);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(1100.), px(800.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        title: Some("NutriLens".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                };

                let window = cx.open_window(options, |window, cx| {
                    let notification_list = cx.new(|cx| NotificationList::new(window, cx));
                    let settings_state = cx.new(|_| SettingsState::new(SettingsStore::load()));
                    let shell = cx.new(|cx| {
                        NutriLensShell::new(notification_list, settings_state, window, cx)
                    });

                    cx.new(|cx| Root::new(shell, window, cx))
                });

                match window {
                    Ok(_) => cx.activate(true),
                    Err(error) => {
                        tracing::error!(error = %error, "failed to open main window");
                        cx.quit();
                    }
                }
            })
        })
        .detach();
    });
}
