/// Entry point and host loop.

mod ui;

use std::fs::{self, File};
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{error, info};

use slidepath::config::{self, GameConfig};
use slidepath::sim::level::load_levels;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::session::Session;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    init_logging();

    let config = GameConfig::load();
    info!("config: {:?}", config);

    let sound = if config.sound { SoundEngine::new().map(Rc::new) } else { None };
    let levels = load_levels(&config);
    let Some(mut session) = Session::new(levels, config.timing.clone(), sound) else {
        eprintln!("No levels to play.");
        return;
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game error: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Slidepath!");
}

/// Log to `slidepath.log` in the data directory; the terminal belongs to
/// the renderer. `RUST_LOG` overrides the default `warn` filter.
fn init_logging() {
    let dir = config::data_dir();
    let file = match fs::create_dir_all(&dir).and_then(|_| File::create(dir.join("slidepath.log"))) {
        Ok(f) => f,
        Err(_) => return, // nowhere to write; keep the screen clean
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        for cmd in kb.commands() {
            if session.handle(cmd)? {
                return Ok(());
            }
        }

        if last_tick.elapsed() >= tick_rate {
            session.tick()?;
            last_tick = Instant::now();
        }
        session.collect_events();

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }
}
