use super::{GpioError, Pin, PinBus};
use log::{debug, info};
use memmap2::{MmapOptions, MmapRaw};
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

/// Highest GPIO line on the BCM283x family.
pub const MAX_BCM_PIN: Pin = 53;

const GPIO_OFFSET: u64 = 0x20_0000;
const BLOCK_SIZE: usize = 4 * 1024;
const DEV_MEM: &str = "/dev/mem";

// Register word offsets inside the GPIO block.
const GPFSEL0: usize = 0;
const GPSET0: usize = 7;
const GPCLR0: usize = 10;

/// Selects the peripheral base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PiModel {
    /// Pi 1 and Zero
    #[default]
    Bcm2835,
    /// Pi 2 and 3
    Bcm2836,
    /// Pi 4
    Bcm2711,
}

impl PiModel {
    pub fn peripheral_base(self) -> u64 {
        match self {
            PiModel::Bcm2835 => 0x2000_0000,
            PiModel::Bcm2836 => 0x3F00_0000,
            PiModel::Bcm2711 => 0xFE00_0000,
        }
    }

    pub fn gpio_base(self) -> u64 {
        self.peripheral_base() + GPIO_OFFSET
    }
}

impl fmt::Display for PiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PiModel::Bcm2835 => "bcm2835",
            PiModel::Bcm2836 => "bcm2836",
            PiModel::Bcm2711 => "bcm2711",
        };
        f.write_str(name)
    }
}

impl FromStr for PiModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcm2835" => Ok(PiModel::Bcm2835),
            "bcm2836" | "bcm2837" => Ok(PiModel::Bcm2836),
            "bcm2711" => Ok(PiModel::Bcm2711),
            other => Err(format!("unknown Raspberry Pi model '{}'", other)),
        }
    }
}

/// GPIO registers mapped from `/dev/mem`.
///
/// Registers are only touched through raw pointers with volatile
/// single-word accesses, so the bus can be shared between actuator
/// threads. GPSET/GPCLR writes only affect the bits that are 1, so
/// actuators driving disjoint pins never interfere. The GPFSEL
/// read-modify-write in `make_output` is only issued by the thread that
/// constructs the drives.
pub struct MappedGpio {
    model: PiModel,
    device: PathBuf,
    registers: Option<MmapRaw>,
}

impl MappedGpio {
    pub fn new(model: PiModel) -> Self {
        Self {
            model,
            device: PathBuf::from(DEV_MEM),
            registers: None,
        }
    }

    pub fn model(&self) -> PiModel {
        self.model
    }

    pub fn is_mapped(&self) -> bool {
        self.registers.is_some()
    }

    fn base_ptr(&self) -> Option<*mut u32> {
        self.registers
            .as_ref()
            .map(|map| map.as_mut_ptr() as *mut u32)
    }

    fn write_register(&self, word: usize, value: u32) {
        if let Some(base) = self.base_ptr() {
            // SAFETY: every register offset used is below BLOCK_SIZE / 4
            // and the mapping lives as long as `self`.
            unsafe { base.add(word).write_volatile(value) }
        }
    }

    fn read_register(&self, word: usize) -> u32 {
        match self.base_ptr() {
            // SAFETY: as in write_register.
            Some(base) => unsafe { base.add(word).read_volatile() },
            None => 0,
        }
    }
}

impl PinBus for MappedGpio {
    fn init(&mut self) -> Result<(), GpioError> {
        if self.registers.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(|source| GpioError::Open {
                path: self.device.display().to_string(),
                source,
            })?;

        let base = self.model.gpio_base();
        let map = MmapOptions::new()
            .offset(base)
            .len(BLOCK_SIZE)
            .map_raw(&file)
            .map_err(|source| GpioError::Map { base, source })?;

        info!("Mapped GPIO registers for {} at {:#x}", self.model, base);
        self.registers = Some(map);
        Ok(())
    }

    fn make_output(&self, pin: Pin) {
        if pin > MAX_BCM_PIN {
            return;
        }
        let word = GPFSEL0 + usize::from(pin) / 10;
        let shift = (u32::from(pin) % 10) * 3;
        // Always clear to input before selecting output.
        let value = self.read_register(word) & !(0b111 << shift);
        self.write_register(word, value);
        self.write_register(word, value | (0b001 << shift));
        debug!("GPIO {} configured as output", pin);
    }

    fn set(&self, pin: Pin) {
        if pin <= MAX_BCM_PIN {
            self.write_register(GPSET0 + usize::from(pin) / 32, 1 << (pin % 32));
        }
    }

    fn clear(&self, pin: Pin) {
        if pin <= MAX_BCM_PIN {
            self.write_register(GPCLR0 + usize::from(pin) / 32, 1 << (pin % 32));
        }
    }
}
