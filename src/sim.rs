//! Scripted robot for demos and tests.
//!
//! Replays a fixed list of readings and keeps the bits of robot state the
//! control core can observe: the load it carries and the wheel targets the
//! last command set.

use std::collections::VecDeque;

use tracing::debug;

use crate::agent::Robot;
use crate::command::Command;
use crate::error::{ActuatorError, SensingError};
use crate::perception::{Color, Load, Position, RawReading};

/// Wheel speed for in-place turns.
pub const DEFAULT_TURNING_SPEED: f64 = 1.5;

/// Target velocities for the right and left wheel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelTargets {
    /// Right wheel velocity.
    pub right: f64,
    /// Left wheel velocity.
    pub left: f64,
}

/// A robot replaying a fixed list of readings and recording what it is told.
///
/// The load it reports follows its own `loadup`/`unload` history, not the script.
#[derive(Debug, Clone)]
pub struct ScriptedRobot {
    readings: VecDeque<RawReading>,
    load: Load,
    turning_speed: f64,
    wheels: WheelTargets,
    executed: Vec<Command>,
    halts: usize,
}

impl ScriptedRobot {
    pub fn new(readings: impl IntoIterator<Item = RawReading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            load: Load::Empty,
            turning_speed: DEFAULT_TURNING_SPEED,
            wheels: WheelTargets::default(),
            executed: Vec::new(),
            halts: 0,
        }
    }

    pub fn with_turning_speed(mut self, turning_speed: f64) -> Self {
        self.turning_speed = turning_speed;
        self
    }

    /// Whether a package is on board.
    pub fn load(&self) -> Load {
        self.load
    }

    /// Wheel velocities set by the last command.
    pub fn wheels(&self) -> WheelTargets {
        self.wheels
    }

    /// Commands executed so far, excluding halts.
    pub fn executed(&self) -> &[Command] {
        &self.executed
    }

    /// How many times the robot was stopped.
    pub fn halts(&self) -> usize {
        self.halts
    }

    /// Readings not sensed yet.
    pub fn remaining(&self) -> usize {
        self.readings.len()
    }

    fn wheel_targets(&self, command: &Command) -> WheelTargets {
        match *command {
            Command::Go(speed) => WheelTargets {
                right: speed as f64,
                left: speed as f64,
            },
            // Driving the left wheel turns the robot right.
            Command::Right(_) => WheelTargets {
                right: 0.0,
                left: self.turning_speed,
            },
            Command::Left(_) => WheelTargets {
                right: self.turning_speed,
                left: 0.0,
            },
            Command::Stop | Command::Loadup | Command::Unload => WheelTargets::default(),
        }
    }
}

impl Robot for ScriptedRobot {
    fn sense(&mut self) -> Result<RawReading, SensingError> {
        let mut reading = self.readings.pop_front().ok_or(SensingError::Exhausted)?;
        reading.load = self.load;
        Ok(reading)
    }

    fn act(&mut self, command: &Command) -> Result<(), ActuatorError> {
        match command {
            Command::Loadup => self.load = Load::Full,
            Command::Unload => self.load = Load::Empty,
            _ => {}
        }
        self.wheels = self.wheel_targets(command);
        self.executed.push(*command);
        debug!(%command, wheels = ?self.wheels, load = %self.load, "executed command");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        self.wheels = WheelTargets::default();
        self.halts += 1;
        Ok(())
    }
}

/// A delivery round: find a green package, pick it up, carry it to red.
///
/// The script repeats until `cycles` readings have been produced.
pub fn delivery_script(cycles: usize) -> Vec<RawReading> {
    let round = [
        RawReading::new(Color::None, Position::None, 1.2, Load::Empty),
        RawReading::new(Color::Green, Position::Left, 0.9, Load::Empty),
        RawReading::new(Color::Green, Position::Center, 0.6, Load::Empty),
        RawReading::new(Color::Green, Position::Center, 0.59, Load::Empty),
        RawReading::new(Color::Green, Position::Center, 0.3, Load::Empty),
        RawReading::new(Color::Green, Position::Near, 0.15, Load::Empty),
        RawReading::new(Color::None, Position::None, 0.12, Load::Empty),
        RawReading::new(Color::Red, Position::Right, 1.0, Load::Empty),
        RawReading::new(Color::Red, Position::Center, 0.5, Load::Empty),
        RawReading::new(Color::Red, Position::Near, 0.16, Load::Empty),
    ];
    round.iter().copied().cycle().take(cycles).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loadup_and_unload_change_sensed_load() {
        let mut robot = ScriptedRobot::new(delivery_script(3));
        assert_eq!(robot.sense().unwrap().load, Load::Empty);

        robot.act(&Command::Loadup).unwrap();
        assert_eq!(robot.sense().unwrap().load, Load::Full);

        robot.act(&Command::Unload).unwrap();
        assert_eq!(robot.sense().unwrap().load, Load::Empty);
        assert_eq!(robot.sense().unwrap_err(), SensingError::Exhausted);
    }

    #[test]
    fn commands_set_wheel_targets() {
        let mut robot = ScriptedRobot::new(Vec::new()).with_turning_speed(2.0);

        robot.act(&Command::Go(3)).unwrap();
        assert_eq!(robot.wheels(), WheelTargets { right: 3.0, left: 3.0 });

        robot.act(&Command::Right(90)).unwrap();
        assert_eq!(robot.wheels(), WheelTargets { right: 0.0, left: 2.0 });

        robot.act(&Command::Left(90)).unwrap();
        assert_eq!(robot.wheels(), WheelTargets { right: 2.0, left: 0.0 });

        robot.stop().unwrap();
        assert_eq!(robot.wheels(), WheelTargets::default());
        assert_eq!(robot.halts(), 1);
        assert_eq!(robot.executed().len(), 3);
    }

    #[test]
    fn delivery_script_repeats() {
        let script = delivery_script(25);
        assert_eq!(script.len(), 25);
        assert_eq!(script[0], script[10]);
        assert_eq!(script[4], script[24]);
    }
}
