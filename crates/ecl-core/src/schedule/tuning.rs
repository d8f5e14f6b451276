use crate::deck::DeckRecord;
use crate::domain::ScheduleResult;
use crate::units::UnitSystem;
use serde::Serialize;

const DAY: f64 = 86_400.0;
const BAR: f64 = 1.0e5;

/// Simulator time stepping and convergence controls from TUNING.
///
/// Fields carry the TUNING item names. Times are in seconds and pressures in
/// pascal; items without a default stay `None` until given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tuning {
    pub tsinit: f64,
    pub tsmaxz: f64,
    pub tsminz: f64,
    pub tsmchp: f64,
    pub tsfmax: f64,
    pub tsfmin: f64,
    pub tsfcnv: f64,
    pub tfdiff: f64,
    pub thrupt: f64,
    pub tmaxwc: Option<f64>,

    pub trgtte: f64,
    pub trgcnv: f64,
    pub trgmbe: f64,
    pub trglcv: f64,
    pub xxxtte: f64,
    pub xxxcnv: f64,
    pub xxxmbe: f64,
    pub xxxlcv: f64,
    pub xxxwfl: f64,
    pub trgfip: f64,
    pub trgsft: Option<f64>,
    pub thionx: f64,
    pub trwght: i32,

    pub newtmx: i32,
    pub newtmn: i32,
    pub litmax: i32,
    pub litmin: i32,
    pub mxwsit: i32,
    pub mxwpit: i32,
    pub ddplim: f64,
    pub ddslim: f64,
    pub trgdpr: f64,
    pub xxxdpr: Option<f64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tsinit: DAY,
            tsmaxz: 365.0 * DAY,
            tsminz: 0.1 * DAY,
            tsmchp: 0.15 * DAY,
            tsfmax: 3.0,
            tsfmin: 0.3,
            tsfcnv: 0.1,
            tfdiff: 1.25,
            thrupt: 1.0e20,
            tmaxwc: None,

            trgtte: 0.1,
            trgcnv: 0.001,
            trgmbe: 1.0e-7,
            trglcv: 0.0001,
            xxxtte: 10.0,
            xxxcnv: 0.01,
            xxxmbe: 1.0e-6,
            xxxlcv: 0.001,
            xxxwfl: 0.001,
            trgfip: 0.025,
            trgsft: None,
            thionx: 0.01,
            trwght: 1,

            newtmx: 12,
            newtmn: 1,
            litmax: 25,
            litmin: 1,
            mxwsit: 8,
            mxwpit: 8,
            ddplim: 1.0e6 * BAR,
            ddslim: 1.0e6,
            trgdpr: 1.0e6 * BAR,
            xxxdpr: None,
        }
    }
}

impl Tuning {
    /// Applies the three TUNING records on top of `self`. Optional items
    /// that are left out keep their current value.
    pub fn apply_records(
        &mut self,
        records: [&DeckRecord; 3],
        units: UnitSystem,
    ) -> ScheduleResult<()> {
        let [time_stepping, convergence, iterations] = records;
        let si = |record: &DeckRecord, name: &str| -> ScheduleResult<f64> {
            record.item(name)?.get_si_double(0, units)
        };
        let optional = |record: &DeckRecord, name: &str| -> ScheduleResult<Option<f64>> {
            let item = record.item(name)?;
            if item.has_value(0) {
                item.get_si_double(0, units).map(Some)
            } else {
                Ok(None)
            }
        };
        let int = |record: &DeckRecord, name: &str| -> ScheduleResult<i32> {
            record.item(name)?.get_int(0)
        };

        self.tsinit = si(time_stepping, "TSINIT")?;
        self.tsmaxz = si(time_stepping, "TSMAXZ")?;
        self.tsminz = si(time_stepping, "TSMINZ")?;
        self.tsmchp = si(time_stepping, "TSMCHP")?;
        self.tsfmax = si(time_stepping, "TSFMAX")?;
        self.tsfmin = si(time_stepping, "TSFMIN")?;
        self.tsfcnv = si(time_stepping, "TSFCNV")?;
        self.tfdiff = si(time_stepping, "TFDIFF")?;
        self.thrupt = si(time_stepping, "THRUPT")?;
        if let Some(value) = optional(time_stepping, "TMAXWC")? {
            self.tmaxwc = Some(value);
        }

        self.trgtte = si(convergence, "TRGTTE")?;
        self.trgcnv = si(convergence, "TRGCNV")?;
        self.trgmbe = si(convergence, "TRGMBE")?;
        self.trglcv = si(convergence, "TRGLCV")?;
        self.xxxtte = si(convergence, "XXXTTE")?;
        self.xxxcnv = si(convergence, "XXXCNV")?;
        self.xxxmbe = si(convergence, "XXXMBE")?;
        self.xxxlcv = si(convergence, "XXXLCV")?;
        self.xxxwfl = si(convergence, "XXXWFL")?;
        self.trgfip = si(convergence, "TRGFIP")?;
        if let Some(value) = optional(convergence, "TRGSFT")? {
            self.trgsft = Some(value);
        }
        self.thionx = si(convergence, "THIONX")?;
        self.trwght = int(convergence, "TRWGHT")?;

        self.newtmx = int(iterations, "NEWTMX")?;
        self.newtmn = int(iterations, "NEWTMN")?;
        self.litmax = int(iterations, "LITMAX")?;
        self.litmin = int(iterations, "LITMIN")?;
        self.mxwsit = int(iterations, "MXWSIT")?;
        self.mxwpit = int(iterations, "MXWPIT")?;
        self.ddplim = si(iterations, "DDPLIM")?;
        self.ddslim = si(iterations, "DDSLIM")?;
        self.trgdpr = si(iterations, "TRGDPR")?;
        if let Some(value) = optional(iterations, "XXXDPR")? {
            self.xxxdpr = Some(value);
        }
        Ok(())
    }
}
