use std::{
    fs,
    io::{self, BufRead, Write},
    thread,
    time::Duration,
};

use crossbeam::channel;
use enum_iterator::all;
use log::{info, warn};
use padinput::{button_name, DeviceId};
use padtuner_core::{
    config::{StickSide, TriggerSide},
    device::DeviceSource,
    poller::{FrameReceiver, Notification, Poller, Record},
    remap::RemapSession,
    store::Store,
    transform::ResponseCurve,
};

const SHOW_TIMEOUT: Duration = Duration::from_millis(250);
const VIBRATE_DURATION: Duration = Duration::from_millis(400);

/// Interactive command prompt wrapped around a [`Poller`].
pub struct Console<D: DeviceSource + 'static, S: Store + Send + Sync + 'static> {
    poller: Poller<D, S>,
    frames: FrameReceiver,
    session: Option<RemapSession>,
}

impl<D: DeviceSource + 'static, S: Store + Send + Sync + 'static> Console<D, S> {
    pub fn new(poller: Poller<D, S>) -> Self {
        let frames = poller.subscribe_frames();

        Self {
            poller,
            frames,
            session: None,
        }
    }

    pub fn run(&mut self) {
        self.spawn_notification_printer();
        self.poller.start();

        println!("Type `help` for commands.");

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut line = String::new();

        loop {
            if panic_trace::tripped() {
                warn!("A worker thread crashed; shutting down");
                break;
            }

            print!("> ");
            io::stdout().flush().ok();

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read command: {}", e);
                    break;
                }
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            if !self.dispatch(&parts) {
                break;
            }
        }

        // Join any capture thread before the poller goes away.
        self.session = None;
        self.poller.stop();
    }

    fn spawn_notification_printer(&self) {
        let (sender, receiver) = channel::unbounded();
        self.poller.send_on_event(sender);

        thread::spawn(move || {
            for note in receiver {
                match note {
                    Notification::ActiveChanged(Some(info)) => {
                        info!("Now tuning {} ({})", info.name, info.id);
                    }
                    Notification::ActiveChanged(None) => info!("No device selected"),
                    Notification::RemapCaptured { target, source } => {
                        println!("{} now reports as {}", label(target), label(source));
                    }
                    Notification::RemapTimedOut { target } => {
                        println!("No press captured for {}; mapping unchanged", label(target));
                    }
                    // Connects and the poll rate are already logged elsewhere.
                    Notification::Connected(_)
                    | Notification::Disconnected(_)
                    | Notification::PollRate(_) => {}
                }
            }
        });
    }

    fn dispatch(&mut self, parts: &[&str]) -> bool {
        if self
            .session
            .as_ref()
            .is_some_and(|session| !session.listening())
        {
            self.session = None;
        }

        match parts {
            ["quit"] | ["exit"] => return false,
            ["help"] => print_help(),
            ["devices"] => self.cmd_devices(),
            ["use", id] => self.cmd_use(id),
            ["show"] => self.cmd_show(),
            ["rate"] => match self.poller.poll_rate() {
                Some(rate) => println!("{rate} polls/s"),
                None => println!("No full window yet"),
            },
            ["config"] => println!("{}", self.poller.export_config()),
            ["deadzone", side, value] => self.cmd_deadzone(side, value),
            ["sens", side, value] => self.cmd_sensitivity(side, value),
            ["curve", side, name] => self.cmd_curve(side, name),
            ["vib", left, right] => self.cmd_vibration_levels(left, right),
            ["mapping"] => self.cmd_mapping(),
            ["map", physical, target] => self.cmd_map(physical, target),
            ["unmap", physical] => self.cmd_unmap(physical),
            ["listen", target] => self.cmd_listen(target),
            ["calibrate"] => self.cmd_calibrate(),
            ["vibrate", args @ ..] => self.cmd_vibrate(args),
            ["stopvib"] => match self.poller.stop_vibration() {
                Ok(()) => println!("ok"),
                Err(e) => println!("{e}"),
            },
            ["export", path] => self.cmd_export(path),
            ["import", path] => self.cmd_import(path),
            ["reset"] => {
                self.poller.reset_config();
                println!("Configuration reset to defaults");
            }
            _ => println!("Unknown command; type `help`"),
        }

        true
    }

    fn cmd_devices(&self) {
        let devices = self.poller.devices();

        if devices.is_empty() {
            println!("No devices connected");
            return;
        }

        let active = self.poller.active().map(|info| info.id);
        for info in devices {
            let marker = if active == Some(info.id) { "*" } else { " " };
            println!("{} {} {}", marker, info.id, info.name);
        }
    }

    fn cmd_use(&self, id: &str) {
        match id.parse::<usize>() {
            Ok(id) => {
                if !self.poller.set_active(DeviceId(id)) {
                    println!("No device {id}");
                }
            }
            Err(_) => println!("Expected a device id"),
        }
    }

    fn cmd_show(&self) {
        match self.frames.recv_timeout(SHOW_TIMEOUT) {
            Ok(record) => print_record(&record),
            Err(_) => println!("No frames yet; is a device connected?"),
        }
    }

    fn cmd_deadzone(&self, side: &str, value: &str) {
        let value = match value.parse::<f32>() {
            Ok(value) => value,
            Err(_) => {
                println!("Expected a percentage");
                return;
            }
        };

        if let Some(side) = stick_side(side) {
            self.poller.set_stick_deadzone(side, value);
        } else if let Some(side) = trigger_side(side) {
            self.poller.set_trigger_deadzone(side, value);
        } else {
            println!("Expected left, right, lt, or rt");
            return;
        }

        println!("ok");
    }

    fn cmd_sensitivity(&self, side: &str, value: &str) {
        let value = match value.parse::<f32>() {
            Ok(value) => value,
            Err(_) => {
                println!("Expected a percentage");
                return;
            }
        };

        if let Some(side) = stick_side(side) {
            self.poller.set_stick_sensitivity(side, value);
        } else if let Some(side) = trigger_side(side) {
            self.poller.set_trigger_sensitivity(side, value);
        } else {
            println!("Expected left, right, lt, or rt");
            return;
        }

        println!("ok");
    }

    fn cmd_curve(&self, side: &str, name: &str) {
        let side = match stick_side(side) {
            Some(side) => side,
            None => {
                println!("Expected left or right");
                return;
            }
        };

        match all::<ResponseCurve>().find(|curve| curve.name() == name) {
            Some(curve) => {
                self.poller.set_stick_curve(side, curve);
                println!("ok");
            }
            None => {
                let names: Vec<&str> = all::<ResponseCurve>().map(|curve| curve.name()).collect();
                println!("Expected one of {}", names.join(", "));
            }
        }
    }

    fn cmd_vibration_levels(&self, left: &str, right: &str) {
        match (left.parse(), right.parse()) {
            (Ok(left), Ok(right)) => {
                self.poller.set_vibration(left, right);
                println!("ok");
            }
            _ => println!("Expected two percentages"),
        }
    }

    fn cmd_mapping(&self) {
        let mapping = self.poller.button_mapping();

        if mapping.is_identity() {
            println!("All buttons report as themselves");
            return;
        }

        for (physical, logical) in mapping.entries() {
            println!("{} reports as {}", label(physical), label(logical));
        }
    }

    fn cmd_map(&self, physical: &str, target: &str) {
        match (physical.parse(), target.parse()) {
            (Ok(physical), Ok(target)) => {
                self.poller.map_button(physical, target);
                println!("{} now reports as {}", label(physical), label(target));
            }
            _ => println!("Expected two button indices"),
        }
    }

    fn cmd_unmap(&self, physical: &str) {
        match physical.parse() {
            Ok(physical) => {
                self.poller.clear_button(physical);
                println!("{} reports as itself", label(physical));
            }
            Err(_) => println!("Expected a button index"),
        }
    }

    fn cmd_listen(&mut self, target: &str) {
        let target = match target.parse::<usize>() {
            Ok(target) => target,
            Err(_) => {
                println!("Expected a button index");
                return;
            }
        };

        self.session = Some(self.poller.remap_listen(target));
        println!(
            "Listening: press the button {} should report as",
            label(target)
        );
    }

    fn cmd_calibrate(&self) {
        match self.poller.calibrate_drift() {
            Ok((left, right)) => println!(
                "Drift stored: left ({:+.3}, {:+.3}) right ({:+.3}, {:+.3})",
                left.x, left.y, right.x, right.y
            ),
            Err(e) => println!("{e}"),
        }
    }

    fn cmd_vibrate(&self, args: &[&str]) {
        let result = match args {
            [] => self.poller.vibrate_default(VIBRATE_DURATION),
            [left, right] => match (left.parse(), right.parse()) {
                (Ok(left), Ok(right)) => self.poller.vibrate(left, right, VIBRATE_DURATION),
                _ => {
                    println!("Expected two percentages");
                    return;
                }
            },
            [left, right, millis] => {
                match (left.parse(), right.parse(), millis.parse::<u64>()) {
                    (Ok(left), Ok(right), Ok(millis)) => {
                        self.poller.vibrate(left, right, Duration::from_millis(millis))
                    }
                    _ => {
                        println!("Expected two percentages and a duration in ms");
                        return;
                    }
                }
            }
            _ => {
                println!("Usage: vibrate [left right [ms]]");
                return;
            }
        };

        match result {
            Ok(()) => println!("ok"),
            Err(e) => println!("{e}"),
        }
    }

    fn cmd_export(&self, path: &str) {
        match fs::write(path, self.poller.export_config()) {
            Ok(()) => println!("Wrote {path}"),
            Err(e) => println!("Failed to write {path}: {e}"),
        }
    }

    fn cmd_import(&self, path: &str) {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                println!("Failed to read {path}: {e}");
                return;
            }
        };

        match self.poller.import_config(&json) {
            Ok(()) => println!("ok"),
            Err(e) => println!("{e}"),
        }
    }
}

fn stick_side(name: &str) -> Option<StickSide> {
    all::<StickSide>().find(|side| side.name() == name)
}

fn trigger_side(name: &str) -> Option<TriggerSide> {
    all::<TriggerSide>().find(|side| side.name() == name)
}

fn label(index: usize) -> String {
    match button_name(index) {
        Some(name) => format!("{name} ({index})"),
        None => format!("button {index}"),
    }
}

fn print_record(record: &Record) {
    let frame = &record.frame;

    println!(
        "left ({:+.3}, {:+.3})  right ({:+.3}, {:+.3})  lt {:.3}  rt {:.3}",
        frame.left.x,
        frame.left.y,
        frame.right.x,
        frame.right.y,
        frame.left_trigger,
        frame.right_trigger
    );

    let pressed: Vec<String> = frame
        .buttons
        .iter()
        .filter(|reading| reading.pressed)
        .map(|reading| label(reading.logical))
        .collect();

    if pressed.is_empty() {
        println!("no buttons pressed");
    } else {
        println!("pressed: {}", pressed.join(", "));
    }
}

fn print_help() {
    println!("devices                list connected devices");
    println!("use <id>               select the device to tune");
    println!("show                   print the latest tuned frame");
    println!("rate                   print the current poll rate");
    println!("config                 print the configuration as JSON");
    println!("deadzone <side> <pct>  set deadzone (left, right, lt, rt)");
    println!("sens <side> <pct>      set sensitivity (left, right, lt, rt)");
    println!("curve <side> <name>    set a stick's response curve");
    println!("vib <left> <right>     store default rumble strengths");
    println!("mapping                list button remaps");
    println!("map <from> <to>        make button <from> report as <to>");
    println!("unmap <button>         restore a button to itself");
    println!("listen <button>        capture the next press as a remap");
    println!("calibrate              store resting stick drift");
    println!("vibrate [l r [ms]]     rumble test");
    println!("stopvib                stop rumble");
    println!("export <path>          write the configuration to a file");
    println!("import <path>          load a configuration from a file");
    println!("reset                  restore default configuration");
    println!("quit                   exit");
}
