use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, scrollable, text, Column, Image};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod capture;
mod config;
mod error;
mod ocr;
mod state;

use capture::{
    Capabilities, CaptureStore, CommandCamera, DialogPermission, FileDialogPicker, GrantFile,
};
use config::Settings;
use ocr::OcrsRecognizer;
use state::data::ImageSource;
use state::session::{Acquisition, Event, Session};

/// Height of the thumbnail area
const THUMBNAIL_HEIGHT: f32 = 320.0;

/// How often expired notices are cleared
const NOTICE_TICK: Duration = Duration::from_millis(250);

/// Main application state
struct TextCapture {
    /// Screen state and orchestration
    session: Session,
    /// Camera, picker, permission and OCR behind the session's effects
    caps: Capabilities,
    settings: Settings,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User action or background result for the session
    Session(Event),
    /// Periodic tick while a notice is visible
    Tick(Instant),
    /// User asked to close the window
    CloseRequested(window::Id),
}

impl TextCapture {
    /// Create a new instance of the application
    fn new(settings: Settings) -> (Self, Task<Message>) {
        let store = Arc::new(CaptureStore::new(
            settings.capture_dir(),
            settings.captures.max_files,
        ));
        // Nothing refers to captures from a previous run
        store.purge();

        let grants = settings
            .permissions
            .remember_grant
            .then(|| GrantFile::new(GrantFile::default_path()));

        let caps = Capabilities {
            permission: Arc::new(DialogPermission::new(grants)),
            picker: Arc::new(FileDialogPicker),
            camera: Arc::new(CommandCamera::new(settings.camera.command.clone())),
            store,
            recognizer: Arc::new(OcrsRecognizer::new(
                settings.detection_model(),
                settings.recognition_model(),
            )),
        };

        tracing::info!(captures = %caps.store.dir().display(), "🎨 Text Capture ready");

        (
            TextCapture {
                session: Session::new(),
                caps,
                settings,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Session(event) => match self.session.handle(event) {
                Some(effect) => {
                    // Run the effect in the background; its result comes back as an event
                    let caps = self.caps.clone();
                    Task::perform(async move { caps.perform(effect).await }, Message::Session)
                }
                None => Task::none(),
            },
            Message::Tick(now) => {
                self.session.expire_notice(now, self.settings.notice_duration());
                Task::none()
            }
            Message::CloseRequested(id) => {
                if self.settings.captures.purge_on_exit {
                    self.caps.store.purge();
                }
                window::close(id)
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let thumbnail: Element<Message> = match self.session.image() {
            Some(image) => Image::new(Handle::from_path(image.path()))
                .width(Length::Fill)
                .height(Length::Fixed(THUMBNAIL_HEIGHT))
                .into(),
            None => container(text("Nenhuma imagem").size(16))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(THUMBNAIL_HEIGHT))
                .into(),
        };

        let recognized = if self.session.text().is_empty() {
            text("O texto reconhecido aparecerá aqui").size(16)
        } else {
            text(self.session.text()).size(18)
        };

        // Triggers are disabled while a dialog or the camera is open
        let idle = !self.session.is_acquiring();
        let triggers = row![
            button("Tirar foto")
                .on_press_maybe(idle.then_some(Message::Session(Event::TakePicture)))
                .padding(10),
            button("Escolher da galeria")
                .on_press_maybe(idle.then_some(Message::Session(Event::PickFromGallery)))
                .padding(10),
        ]
        .spacing(10);

        let status = match self.session.acquisition() {
            Some(Acquisition::Permission) => "Aguardando permissão da câmera...",
            Some(Acquisition::Image(ImageSource::Camera)) => "Aguardando a câmera...",
            Some(Acquisition::Image(ImageSource::Gallery)) => "Aguardando a seleção...",
            None if self.session.is_recognizing() => "Reconhecendo texto...",
            None => "",
        };

        let notice = self.session.notice().map(|notice| {
            container(text(notice.message.as_str()).size(16))
                .padding(10)
                .style(container::rounded_box)
        });

        let content: Column<Message> = column![
            thumbnail,
            scrollable(recognized).height(Length::Fill).width(Length::Fill),
            text(status).size(14),
            triggers,
        ]
        .push_maybe(notice)
        .spacing(20)
        .padding(30)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let ticks = if self.session.notice().is_some() {
            iced::time::every(NOTICE_TICK).map(Message::Tick)
        } else {
            Subscription::none()
        };

        Subscription::batch([ticks, window::close_requests().map(Message::CloseRequested)])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Log to stderr; `RUST_LOG` overrides the configured level
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn main() -> iced::Result {
    // A broken settings file must not keep the app from starting
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    init_logging(&settings.log_level);
    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "using default settings");
    }

    iced::application("Text Capture", TextCapture::update, TextCapture::view)
        .theme(TextCapture::theme)
        .subscription(TextCapture::subscription)
        .window(window::Settings {
            size: Size::new(520.0, 760.0),
            // Captures are purged before the window closes
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .centered()
        .run_with(move || TextCapture::new(settings))
}
