//! Station manager — owns every station, routes detections, and tracks
//! one monitoring task per open gate.
//!
//! ```text
//!  route_detection(subject)
//!     │  subject → station id (case-insensitive)
//!     ▼
//!  Station::open_for_subject ──Opened──▶ spawn monitor ──▶ registry[id]
//!
//!  close_all()
//!     cancel every registered task ─▶ join all ─▶ force-close every gate
//! ```
//!
//! The registry is only touched from synchronous sections (route, reap,
//! drain), never across an `.await`, so its mutations cannot interleave.
//! Each station's own phase stays the source of truth for "busy".

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use edge_executor::{LocalExecutor, Task};
use heapless::FnvIndexMap;
use log::{debug, error, info};

use crate::app::events::FeederEvent;
use crate::app::ports::{Board, EventSink};
use crate::config::{FeederConfig, MAX_STATIONS, StationId};
use crate::drivers::servo::ServoGate;
use crate::error::{ConfigError, HardwareError};
use crate::sensors::presence::PresenceDetector;

use super::cancel::CancelToken;
use super::station::Station;
use super::{Admission, EXECUTOR_SLOTS, MonitorExit};

/// Executor every monitoring task is spawned on.
pub type Executor = LocalExecutor<'static, EXECUTOR_SLOTS>;

struct MonitorHandle {
    cancel: Rc<CancelToken>,
    task: Task<MonitorExit>,
}

pub struct StationManager<'e, B: Board, S> {
    executor: &'e Executor,
    board: RefCell<B>,
    stations: FnvIndexMap<StationId, Rc<Station<B::Pin>>, MAX_STATIONS>,
    assignments: BTreeMap<String, StationId>,
    monitors: RefCell<FnvIndexMap<StationId, MonitorHandle, MAX_STATIONS>>,
    sink: Rc<RefCell<S>>,
}

impl<'e, B, S> StationManager<'e, B, S>
where
    B: Board,
    B::Pin: 'static,
    S: EventSink + 'static,
{
    /// Build one station per configured id, each with the subjects the
    /// config assigns to it.  Stations with no subjects are unreachable
    /// but still built, so shutdown closes their gates too.
    pub fn new(
        executor: &'e Executor,
        board: B,
        config: &FeederConfig,
        sink: Rc<RefCell<S>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let timing = config.cycle_timing();

        let mut stations = FnvIndexMap::new();
        for pins in &config.stations {
            let allowed = config.authorized_subjects(pins.id);
            info!("Feeder {}: created with allowed subjects {:?}", pins.id, allowed);
            let gate = ServoGate::new(
                pins.id,
                pins.servo_pin,
                config.servo_open_angle,
                config.servo_closed_angle,
            );
            let detector = PresenceDetector::new(pins.id, pins.sensor_pin, config.presence_wait_poll());
            let station = Station::new(pins.id, allowed, gate, detector, timing);
            stations
                .insert(pins.id, Rc::new(station))
                .map_err(|_| ConfigError::TooManyStations)?;
        }

        let assignments = config
            .assignments
            .iter()
            .map(|(subject, id)| (subject.to_lowercase(), *id))
            .collect();

        Ok(Self {
            executor,
            board: RefCell::new(board),
            stations,
            assignments,
            monitors: RefCell::new(FnvIndexMap::new()),
            sink,
        })
    }

    /// Build and set up in one step; the daemon's startup path.
    pub fn start(
        executor: &'e Executor,
        board: B,
        config: &FeederConfig,
        sink: Rc<RefCell<S>>,
    ) -> crate::error::Result<Self> {
        let manager = Self::new(executor, board, config, sink)?;
        manager.setup()?;
        Ok(manager)
    }

    /// Bind every gate and sensor pin.  Any failure aborts startup.
    pub fn setup(&self) -> Result<(), HardwareError> {
        let mut board = self.board.borrow_mut();
        for station in self.stations.values() {
            station.setup(&mut *board)?;
        }
        self.emit(FeederEvent::Ready {
            stations: self.stations.len(),
        });
        Ok(())
    }

    // ── Routing ───────────────────────────────────────────────

    /// Open the station owning `subject` and start monitoring it.
    ///
    /// Returns `false` for unknown subjects, busy stations, unauthorized
    /// subjects and hardware faults; each is reported through the sink.
    pub fn route_detection(&self, subject: &str) -> bool {
        let Some(id) = self.assignments.get(&subject.to_lowercase()).copied() else {
            self.emit(FeederEvent::UnknownSubject {
                subject: subject.to_string(),
            });
            return false;
        };
        let Some(station) = self.stations.get(&id) else {
            self.emit(FeederEvent::UnknownStation { station: id });
            return false;
        };

        self.reap_finished();

        match station.open_for_subject(subject) {
            Ok(Admission::Opened) => {
                self.emit(FeederEvent::Opened {
                    station: id,
                    subject: subject.to_string(),
                });
                self.start_monitor(station);
                true
            }
            Ok(admission) => {
                if let Some(reason) = admission.rejection() {
                    self.emit(FeederEvent::Rejected {
                        station: id,
                        subject: subject.to_string(),
                        reason,
                    });
                }
                false
            }
            Err(error) => {
                self.emit(FeederEvent::OpenFailed { station: id, error });
                false
            }
        }
    }

    fn start_monitor(&self, station: &Rc<Station<B::Pin>>) {
        let id = station.id();
        let cancel = Rc::new(CancelToken::new());

        let task = {
            let station = Rc::clone(station);
            let cancel = Rc::clone(&cancel);
            let sink = Rc::clone(&self.sink);
            self.executor.spawn(async move {
                let exit = station.monitor_and_close(&cancel).await;
                sink.borrow_mut().emit(&FeederEvent::Closed {
                    station: station.id(),
                    exit: exit.clone(),
                });
                exit
            })
        };

        match self
            .monitors
            .borrow_mut()
            .insert(id, MonitorHandle { cancel, task })
        {
            Ok(None) => {}
            // A live handle here would mean the station was idle while its
            // task still ran; keep that task running rather than drop it.
            Ok(Some(previous)) => previous.task.detach(),
            Err((id, handle)) => {
                error!("Feeder {}: monitor registry full, task untracked", id);
                handle.task.detach();
            }
        }
    }

    /// Drop handles whose task already completed.
    fn reap_finished(&self) {
        let mut monitors = self.monitors.borrow_mut();
        let finished: Vec<StationId> = monitors
            .iter()
            .filter(|(_, handle)| handle.task.is_finished())
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            monitors.remove(&id);
        }
    }

    // ── Shutdown ──────────────────────────────────────────────

    /// Cancel and join every monitoring task, then command every gate shut.
    /// Safe to call repeatedly and with nothing open.
    pub async fn close_all(&self) {
        info!("Closing all feeders");
        loop {
            let handles = self.drain_monitors();
            if handles.is_empty() {
                break;
            }
            for (_, handle) in &handles {
                handle.cancel.cancel();
            }
            for (id, handle) in handles {
                let exit = handle.task.await;
                debug!("Feeder {}: monitor joined ({:?})", id, exit);
            }
        }

        for station in self.stations.values() {
            station.force_close();
        }
        self.emit(FeederEvent::Shutdown {
            stations: self.stations.len(),
        });
        info!("All feeders closed");
    }

    fn drain_monitors(&self) -> Vec<(StationId, MonitorHandle)> {
        let mut monitors = self.monitors.borrow_mut();
        let ids: Vec<StationId> = monitors.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| monitors.remove(&id).map(|handle| (id, handle)))
            .collect()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn station(&self, id: StationId) -> Option<&Station<B::Pin>> {
        self.stations.get(&id).map(|s| &**s)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station<B::Pin>> {
        self.stations.values().map(|s| &**s)
    }

    /// Station that `subject` routes to, if any.
    pub fn station_for(&self, subject: &str) -> Option<StationId> {
        self.assignments.get(&subject.to_lowercase()).copied()
    }

    /// Monitoring tasks still running.
    pub fn active_monitors(&self) -> usize {
        self.reap_finished();
        self.monitors.borrow().len()
    }

    pub fn is_monitoring(&self, id: StationId) -> bool {
        self.reap_finished();
        self.monitors.borrow().contains_key(&id)
    }

    fn emit(&self, event: FeederEvent) {
        self.sink.borrow_mut().emit(&event);
    }
}
