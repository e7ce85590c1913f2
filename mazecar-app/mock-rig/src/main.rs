use std::convert::Infallible;
use std::io::BufRead;

use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use mazecar_core::mk_static;
use mazecar_core::utils::controllers::drive::{
    DriveCommand, DriveConfig, DriveSystem, Motor, TankDrive, DRIVE_CHANNEL,
};
use mazecar_core::utils::controllers::{SystemCommand, SystemController, FOLLOW_STOP};
use mazecar_core::utils::math::compass::Compass;
use mazecar_core::utils::sensors::{AngularRate, RangeFinder};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Wall-follow run duration in milliseconds
    #[clap(long, default_value_t = 5000)]
    duration_ms: u64,
    /// Base motor speed in duty units (0-255)
    #[clap(long, default_value_t = 150)]
    base_speed: u8,
    /// Log decided speeds without applying them to the motors
    #[clap(long)]
    dry_run: bool,
    /// Fire the external stop request this many milliseconds into the run
    #[clap(long)]
    stop_after_ms: Option<u64>,
    /// Read JSON commands from stdin instead of running the demo script
    #[clap(long)]
    interactive: bool,
}

/// Range sensor that replays a scripted list of readings, cycling.
struct ScriptedRange {
    readings_mm: Vec<u16>,
    next: usize,
}

impl ScriptedRange {
    fn new(readings_mm: Vec<u16>) -> Self {
        Self {
            readings_mm,
            next: 0,
        }
    }
}

impl RangeFinder for ScriptedRange {
    type Error = Infallible;

    fn distance_mm(&mut self) -> Result<u16, Self::Error> {
        let mm = self.readings_mm[self.next];
        self.next = (self.next + 1) % self.readings_mm.len();
        Ok(mm)
    }
}

/// Gyro that reports a constant yaw rate.
struct FixedRateGyro(f32);

impl AngularRate for FixedRateGyro {
    type Error = Infallible;

    fn rate_dps(&mut self) -> Result<f32, Self::Error> {
        Ok(self.0)
    }
}

/// Direction line that logs level changes to the console.
struct LogPin(&'static str);

impl PinErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        tracing::debug!("{} low", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        tracing::debug!("{} high", self.0);
        Ok(())
    }
}

/// PWM enable that logs duty writes to the console.
struct LogPwm(&'static str);

impl PwmErrorType for LogPwm {
    type Error = Infallible;
}

impl SetDutyCycle for LogPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), Self::Error> {
        tracing::debug!("{} duty {}", self.0, duty);
        Ok(())
    }
}

type SimController = SystemController<
    ScriptedRange,
    ScriptedRange,
    ScriptedRange,
    ScriptedRange,
    FixedRateGyro,
    LogPin,
    LogPwm,
>;

#[embassy_executor::task]
async fn drive_task(mut ctrl: SimController) -> ! {
    ctrl.drive_ch().await
}

/// Corridor walk: starts centered, drifts toward the left wall, recovers.
fn corridor() -> (ScriptedRange, ScriptedRange) {
    let left = ScriptedRange::new(vec![20, 20, 10, 0, 0, 10, 20, 30, 40, 30, 20]);
    let right = ScriptedRange::new(vec![20, 20, 30, 40, 50, 40, 30, 20, 10, 20, 20]);
    (left, right)
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let mut cfg = DriveConfig::default();
    cfg.wall_follow.base_speed = opts.base_speed;
    cfg.wall_follow.run_duration = Duration::from_millis(opts.duration_ms);
    cfg.wall_follow.apply_output = !opts.dry_run;

    let left_motor = Motor::new(LogPin("in3"), LogPin("in4"), LogPwm("enB"));
    let right_motor = Motor::new(LogPin("in1"), LogPin("in2"), LogPwm("enA"));
    let tank = TankDrive::new(left_motor, right_motor, opts.base_speed, 10);

    let (left_ir, right_ir) = corridor();
    let system = DriveSystem::new(
        left_ir,
        right_ir,
        ScriptedRange::new(vec![200]),
        ScriptedRange::new(vec![200]),
        FixedRateGyro(1.5),
        tank,
        cfg,
    );

    spawner
        .spawn(drive_task(SystemController::new(system)))
        .unwrap();

    if opts.interactive {
        info!("reading JSON commands from stdin, e.g. {{\"ct\":\"d\",\"dc\":\"follow\"}}");
        std::thread::spawn(|| {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(_) => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<SystemCommand>(&line) {
                    Ok(SystemCommand::D(cmd)) => {
                        if DRIVE_CHANNEL.sender().try_send(cmd).is_err() {
                            error!("command queue full, dropping command");
                        }
                    }
                    Err(e) => error!("bad command: {}", e),
                }
            }
        });
        return;
    }

    // Demo script: one wall-follow run, then a grid move east from a
    // north-facing start.
    info!("starting wall-follow run ({} ms)", opts.duration_ms);
    DRIVE_CHANNEL.sender().send(DriveCommand::Follow).await;

    if let Some(ms) = opts.stop_after_ms {
        Timer::after(Duration::from_millis(ms)).await;
        info!("firing external stop");
        FOLLOW_STOP.signal(());
    }

    Timer::after(Duration::from_millis(opts.duration_ms + 500)).await;
    DRIVE_CHANNEL.sender().send(DriveCommand::ReadHeading).await;
    DRIVE_CHANNEL
        .sender()
        .send(DriveCommand::Move {
            t: Compass::East,
            f: Compass::North,
        })
        .await;
    Timer::after(Duration::from_millis(500)).await;
    DRIVE_CHANNEL.sender().send(DriveCommand::Stop).await;
    info!("demo script complete");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let executor = mk_static!(Executor, Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
