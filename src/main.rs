use cgmath::Vector2;
use chrono::Utc;
use iced::widget::image::Handle;
use iced::widget::{canvas, column, container, stack, text};
use iced::{window, Element, Length, Subscription, Task, Theme};
use std::collections::HashMap;
use std::time::{Duration, Instant};

mod controller;
mod media;
mod picker;
mod state;
mod ui;
mod viewer;

use controller::{InteractionController, LoadRequest, Outcome};
use media::assets::discover_gallery;
use media::loader::{load_panorama, LoadedPanorama};
use media::thumbnail::generate_thumbnail;
use media::{MediaError, ObjectUrls};
use picker::{Accept, ChooseFilesOptions, PickedFiles, ReturnType};
use state::prefs::Preferences;
use state::session::Session;
use ui::canvas::PanoramaCanvas;
use viewer::{
    AutorotateConfig, AutorotatePlugin, PluginConfig, SphereViewer, ViewerConfig, ViewerEvent,
    ViewerHandle,
};

/// Name of the surface the renderer draws into
const VIEWER_CONTAINER: &str = "viewer";

/// Animation frame interval while autorotating
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Main application state
struct PanoViewer {
    /// Gallery, active panorama and interaction mode
    session: Session,
    /// The panorama renderer, released on window close
    viewer: ViewerHandle,
    controller: InteractionController,
    /// Object URLs handed out for uploaded files
    urls: ObjectUrls,
    /// Thumbnail cache keyed by panorama id
    thumbnails: HashMap<String, Handle>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// The renderer published an event a listener asked for
    Viewer(ViewerEvent),
    /// Drag on the surface: pixel delta and surface width
    Pan(Vector2<f32>, f32),
    Zoom(f32),
    /// Animation frame
    Tick(Instant),
    ToggleMode,
    ToggleAutorotate,
    SelectThumbnail(String),
    /// User clicked the "Upload panorama" button
    Upload,
    FilesChosen(PickedFiles),
    /// Background decode completed
    PanoramaLoaded(LoadRequest, Result<LoadedPanorama, MediaError>),
    /// Settle delay elapsed for a generation
    MarkersSettled(u64),
    ThumbnailReady(String, Result<Handle, MediaError>),
    CloseRequested(window::Id),
}

impl PanoViewer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let (prefs, prefs_error) = Preferences::load_or_default();
        init_logging(&prefs.log_level);
        if let Some(e) = prefs_error {
            log::warn!("Using default preferences: {}", e);
        }

        let items = discover_gallery(&prefs.assets_dir);
        let mut session = Session::seeded(items, prefs.initial_index);
        log::info!("Panorama viewer initialized with {} panoramas", session.len());

        let config = ViewerConfig {
            container: VIEWER_CONTAINER.to_string(),
            panorama: session.active().map(|item| item.url.clone()).unwrap_or_default(),
            fisheye: prefs.fisheye,
            default_zoom_lvl: prefs.default_zoom_lvl,
            navbar: prefs.navbar,
            plugins: vec![
                PluginConfig::Autorotate(AutorotateConfig {
                    speed: f64::from(prefs.autorotate_speed()),
                    autorotate_pitch: f64::from(prefs.autorotate.pitch),
                }),
                PluginConfig::Markers,
            ],
        };

        let mut viewer = ViewerHandle::create(config).unwrap_or_else(|e| {
            log::error!("Failed to create viewer: {}", e);
            ViewerHandle::default()
        });
        let mut controller = InteractionController::new(Duration::from_millis(prefs.marker_settle_ms));

        let mut status = if session.is_empty() {
            format!("No panoramas found in {}", prefs.assets_dir.display())
        } else {
            format!("Ready. {} panoramas in gallery.", session.len())
        };

        let mut initial_load = None;
        match viewer.get_mut() {
            Some(renderer) => {
                controller.attach(renderer);
                if prefs.autorotate.autostart {
                    if let Some(autorotate) = renderer.plugin_mut::<AutorotatePlugin>() {
                        autorotate.start();
                    }
                }

                let initial = session.active().map(|item| item.id.clone());
                initial_load =
                    initial.and_then(|id| controller.switch_panorama(&mut session, renderer, &id));
            }
            None => status = "Viewer unavailable".to_string(),
        }

        let app = PanoViewer {
            session,
            viewer,
            controller,
            urls: ObjectUrls::new(),
            thumbnails: HashMap::new(),
            status,
        };

        let mut startup: Vec<Task<Message>> = initial_load.into_iter().map(|r| app.load(r)).collect();
        startup.extend(app.session.items().iter().map(|item| app.thumbnail(&item.id)));

        (app, Task::batch(startup))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Viewer(event) => {
                let Some(viewer) = self.viewer.get_mut() else {
                    return Task::none();
                };
                let outcome = self.controller.handle_event(&mut self.session, viewer, event);
                self.follow(outcome)
            }
            Message::Pan(delta, width) => {
                if let Some(viewer) = self.viewer.get_mut() {
                    viewer.pan(delta, width);
                }
                Task::none()
            }
            Message::Zoom(delta) => {
                if let Some(viewer) = self.viewer.get_mut() {
                    viewer.zoom_by(delta);
                }
                Task::none()
            }
            Message::Tick(now) => {
                if let Some(viewer) = self.viewer.get_mut() {
                    viewer.tick(now);
                }
                Task::none()
            }
            Message::ToggleMode => {
                if let Some(viewer) = self.viewer.get_mut() {
                    self.controller.toggle_mode(&mut self.session, viewer);
                }
                Task::none()
            }
            Message::ToggleAutorotate => {
                if let Some(autorotate) = self
                    .viewer
                    .get_mut()
                    .and_then(|viewer| viewer.plugin_mut::<AutorotatePlugin>())
                {
                    autorotate.toggle();
                }
                Task::none()
            }
            Message::SelectThumbnail(id) => self.switch_to(&id),
            Message::Upload => {
                let options = ChooseFilesOptions {
                    accept: Accept::Image,
                    multiple: false,
                    return_type: ReturnType::Url,
                };
                Task::perform(
                    picker::choose_files(options, self.urls.clone()),
                    Message::FilesChosen,
                )
            }
            Message::FilesChosen(files) => self.add_uploads(files),
            Message::PanoramaLoaded(request, result) => {
                let Some(viewer) = self.viewer.get_mut() else {
                    return Task::none();
                };

                match viewer.finish_load(&request.url, result) {
                    Ok(Some(event)) => {
                        self.status = format!("Showing '{}'", request.panorama_id);
                        let outcome = self.controller.handle_event(&mut self.session, viewer, event);
                        self.follow(outcome)
                    }
                    Ok(None) => Task::none(),
                    Err(e) => {
                        log::error!("Failed to load '{}': {}", request.panorama_id, e);
                        self.status = format!("⚠️ {}", e);
                        self.controller.load_failed(&mut self.session, viewer, request.generation);
                        Task::none()
                    }
                }
            }
            Message::MarkersSettled(generation) => {
                if let Some(viewer) = self.viewer.get_mut() {
                    self.controller.settle(&self.session, viewer, generation);
                }
                Task::none()
            }
            Message::ThumbnailReady(id, result) => {
                match result {
                    Ok(handle) => {
                        self.thumbnails.insert(id, handle);
                    }
                    Err(e) => log::warn!("No thumbnail for '{}': {}", id, e),
                }
                Task::none()
            }
            Message::CloseRequested(id) => {
                self.viewer.destroy();
                window::close(id)
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let surface: Element<'_, Message> = match self.viewer.get() {
            Some(viewer) => canvas(PanoramaCanvas { viewer })
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(text("Viewer unavailable").size(24))
                .center(Length::Fill)
                .into(),
        };

        let rotating = self.viewer.get().is_some_and(SphereViewer::is_animating);
        let controls = column![
            ui::toolbar::view(self.session.mode(), rotating, &self.status),
            ui::gallery::view(self.session.snapshot(), &self.thumbnails),
        ]
        .spacing(10)
        .padding(16);

        let overlay = container(controls).align_bottom(Length::Fill);

        stack![surface, overlay].into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        let close = window::close_requests().map(Message::CloseRequested);

        if self.viewer.get().is_some_and(SphereViewer::is_animating) {
            Subscription::batch([close, iced::time::every(FRAME_INTERVAL).map(Message::Tick)])
        } else {
            close
        }
    }

    /// Schedule whatever the controller asked for
    fn follow(&self, outcome: Outcome) -> Task<Message> {
        match outcome {
            Outcome::None => Task::none(),
            Outcome::Load(request) => self.load(request),
            Outcome::Settle { generation, delay } => Task::perform(tokio::time::sleep(delay), move |_| {
                Message::MarkersSettled(generation)
            }),
        }
    }

    fn switch_to(&mut self, id: &str) -> Task<Message> {
        let Some(viewer) = self.viewer.get_mut() else {
            return Task::none();
        };

        match self.controller.switch_panorama(&mut self.session, viewer, id) {
            Some(request) => self.load(request),
            None => {
                log::debug!("No panorama with id '{}'", id);
                Task::none()
            }
        }
    }

    /// Decode the requested panorama in the background
    fn load(&self, request: LoadRequest) -> Task<Message> {
        match self.urls.resolve_source(&request.url) {
            Ok(path) => Task::perform(load_panorama(path), move |result| {
                Message::PanoramaLoaded(request.clone(), result)
            }),
            Err(e) => Task::done(Message::PanoramaLoaded(request, Err(e))),
        }
    }

    fn thumbnail(&self, id: &str) -> Task<Message> {
        let Some(item) = self.session.find(id) else {
            return Task::none();
        };

        let id = id.to_string();
        match self.urls.resolve_source(&item.url) {
            Ok(path) => Task::perform(generate_thumbnail(path), move |result| {
                Message::ThumbnailReady(id.clone(), result)
            }),
            Err(e) => Task::done(Message::ThumbnailReady(id, Err(e))),
        }
    }

    /// Add the picked file to the gallery and show it
    fn add_uploads(&mut self, files: PickedFiles) -> Task<Message> {
        let PickedFiles::Urls(files) = files else {
            log::warn!("Upload expects object URLs");
            return Task::none();
        };
        let Some(file) = files.into_iter().next() else {
            log::debug!("Upload cancelled");
            return Task::none();
        };
        let Some(viewer) = self.viewer.get_mut() else {
            self.urls.revoke(&file.url);
            return Task::none();
        };

        let name = file.file.name.clone();
        let id = format!("pano-{}", Utc::now().timestamp_millis());

        match self.controller.upload(&mut self.session, viewer, &self.urls, file, id.clone()) {
            Ok(request) => {
                self.status = format!("Added {}", name);
                Task::batch([self.load(request), self.thumbnail(&id)])
            }
            Err(e) => {
                self.status = format!("⚠️ {}", e);
                Task::none()
            }
        }
    }
}

/// Initialise the terminal logger; `RUST_LOG` overrides the preferences level
fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn main() -> iced::Result {
    iced::application("Panorama Viewer", PanoViewer::update, PanoViewer::view)
        .theme(PanoViewer::theme)
        .subscription(PanoViewer::subscription)
        .exit_on_close_request(false)
        .centered()
        .run_with(PanoViewer::new)
}
