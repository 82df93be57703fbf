//! Strumboard - play chords from the computer keyboard and strum them with the pointer.
//!
//! Hold a chord key, then sweep the pointer across the window: the window is the strumplate.

mod cli;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use strumboard::{Action, Key, Knob, Patch, Performer, Score, SynthEngine, render_score, write_wav};

use cli::Args;

const WINDOW_WIDTH: f64 = 960.0;
const WINDOW_HEIGHT: f64 = 240.0;

/// Main application state
struct App {
    window: Option<Window>,
    engine: SynthEngine,
    performer: Performer,
    volume: Knob,
    sustain: Knob,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(patch: &Patch, volume: f32) -> anyhow::Result<Self> {
        let engine = SynthEngine::new(patch.instrument.clone())?;
        let volume = Knob::volume(volume);
        let sustain = Knob::sustain(patch.instrument.release);
        engine.set_volume(volume.value());
        engine.set_release(sustain.value());

        Ok(Self {
            window: None,
            engine,
            performer: Performer::from_patch(patch),
            volume,
            sustain,
            failure: None,
        })
    }

    fn start_audio(&mut self) {
        if self.engine.is_started() {
            return;
        }
        if let Err(e) = self.engine.start() {
            log::error!("could not start audio: {}", e);
        }
        self.update_title();
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let chord = match self.performer.current_chord() {
            Some(chord) => chord.to_string(),
            None => "-".to_string(),
        };
        let title = if self.engine.is_started() {
            format!(
                "Strumboard | {} | volume {:.0}% | sustain {:.2}s",
                chord,
                self.volume.value() * 100.0,
                self.sustain.value(),
            )
        } else {
            "Strumboard | press Enter or click to start".to_string()
        };
        window.set_title(&title);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: Key, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match key {
            Key::Escape if pressed => event_loop.exit(),
            Key::Enter | Key::Space if pressed && !self.engine.is_started() => self.start_audio(),
            Key::ArrowUp | Key::ArrowDown if pressed => {
                let volume = self.volume.turn(if key == Key::ArrowUp { 1 } else { -1 });
                self.engine.set_volume(volume);
            }
            Key::ArrowRight | Key::ArrowLeft if pressed => {
                let sustain = self.sustain.turn(if key == Key::ArrowRight { 1 } else { -1 });
                self.engine.set_release(sustain);
            }
            _ if pressed => {
                self.performer.key_down(key, &mut self.engine);
            }
            _ => {
                self.performer.key_up(key, &mut self.engine);
            }
        }
        self.update_title();
    }

    fn handle_pointer(&mut self, x: f64) {
        let Some(window) = &self.window else {
            return;
        };
        let width = window.inner_size().width;
        if width == 0 {
            return;
        }
        let played = self.performer.strum((x / width as f64) as f32, &mut self.engine);
        if !played.is_empty() {
            log::trace!("strum {:?}", played.iter().map(|n| n.to_string()).collect::<Vec<_>>());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Strumboard")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        match event_loop.create_window(window_attributes) {
            Ok(window) => {
                self.window = Some(window);
                self.update_title();
                log::info!("Hold a chord key and sweep the pointer across the window to strum. Escape quits.");
            }
            Err(e) => {
                self.failure = Some(anyhow::anyhow!("could not create window: {}", e));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
                ..
            } => {
                if let Some(key) = key_from_code(code) {
                    self.handle_key(event_loop, key, state);
                }
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.start_audio();
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_pointer(position.x),
            WindowEvent::CursorLeft { .. } => self.performer.lift(),
            WindowEvent::Focused(false) => {
                // key-up events are lost once focus goes elsewhere
                self.performer.release_all(&mut self.engine);
                self.update_title();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.performer.release_all(&mut self.engine);
        self.engine.stop();
    }
}

// Key variants share their names with winit's physical key codes.
macro_rules! map_codes {
    ($code:expr, $($name:ident),* $(,)?) => {
        match $code {
            $(KeyCode::$name => Some(Key::$name),)*
            _ => None,
        }
    };
}

fn key_from_code(code: KeyCode) -> Option<Key> {
    map_codes!(
        code,
        Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Digit0,
        Minus, Equal, Backspace,
        KeyQ, KeyW, KeyE, KeyR, KeyT, KeyY, KeyU, KeyI, KeyO, KeyP,
        BracketLeft, BracketRight, Backslash,
        KeyA, KeyS, KeyD, KeyF, KeyG, KeyH, KeyJ, KeyK, KeyL,
        Semicolon, Quote, Enter,
        KeyZ, KeyX, KeyC, KeyV, KeyB, KeyN, KeyM,
        Comma, Period, Slash,
        Space, Escape, ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    )
}

fn render(args: &Args, patch: &Patch) -> anyhow::Result<()> {
    let (Some(score_path), Some(out)) = (&args.render, &args.out) else {
        anyhow::bail!("--render needs --out");
    };
    let mut score = Score::load(score_path).map_err(|e| anyhow::anyhow!("{}", e))?;
    score.actions.insert(0, Action::Volume(Knob::volume(args.volume).value()));
    let samples = render_score(&score, patch, args.sample_rate as f32)?;
    write_wav(out, &samples, args.sample_rate)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let patch = args.load_patch()?;

    if args.render.is_some() {
        return render(&args, &patch);
    }

    let mut app = App::new(&patch, args.volume)?;
    let event_loop = EventLoop::new().map_err(|e| anyhow::anyhow!("{}", e))?;
    event_loop.run_app(&mut app).map_err(|e| anyhow::anyhow!("{}", e))?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
