//! Register maps of the on-board devices.
//!
//! The TTCrx and the ADM1025 are both behind an 
//! I2C-like interface, each register holds one byte.
//! The FED system window is served by the FPGA and
//! holds the TTCrx reset line and the clock select.
//!
//! Please refer to the TTCrx reference manual and the 
//! ADM1025 datasheet.

//========== TTCrx Registers ============
//
//=======================================

pub const TTCRX_MAX_ADDRESS         : u32 = 31;

pub const TTCRX_FINE_DELAY_1        : u32 = 0;  // [7:0] deskewed clock 1, packed (n<<4)|m
pub const TTCRX_FINE_DELAY_2        : u32 = 1;  // [7:0] deskewed clock 2, packed (m<<4)|n
pub const TTCRX_COARSE_DELAY        : u32 = 2;  // [3:0] L1Accept, [7:4] BrcstStr2
pub const TTCRX_CONTROL             : u32 = 3;  // see CTRL_* bits below

pub const TTCRX_SINGLE_ERR_CNT_LSB  : u32 = 8;  // [7:0] single bit error count [7:0]
pub const TTCRX_SINGLE_ERR_CNT_MSB  : u32 = 9;  // [7:0] single bit error count [15:8]
pub const TTCRX_DOUBLE_ERR_CNT      : u32 = 10; // [7:0]
pub const TTCRX_SEU_ERR_CNT         : u32 = 11; // [7:0]

pub const TTCRX_ID_LSB              : u32 = 16; // [7:0] IAC id [7:0]
pub const TTCRX_ID_MSB              : u32 = 17; // [5:0] IAC id [13:8], [7:6] read-only mode bits
pub const TTCRX_I2C_ID              : u32 = 18; // [5:0]
pub const TTCRX_CONFIG_1            : u32 = 19; // [2:0] DLL pump current, [5:3] PLL pump current
pub const TTCRX_CONFIG_2            : u32 = 20;
pub const TTCRX_CONFIG_3            : u32 = 21;
pub const TTCRX_STATUS              : u32 = 22; // [7:4] see STATUS_* bits below

pub const TTCRX_BUNCH_CNT_LSB       : u32 = 24; // [7:0] bunch counter [7:0]
pub const TTCRX_BUNCH_CNT_MSB       : u32 = 25; // [3:0] bunch counter [11:8]
pub const TTCRX_EVENT_CNT_LSB       : u32 = 26; // [7:0] event counter [7:0]
pub const TTCRX_EVENT_CNT_MID       : u32 = 27; // [7:0] event counter [15:8]
pub const TTCRX_EVENT_CNT_MSB       : u32 = 28; // [7:0] event counter [23:16]

/// Writing this value to a counter register resets it
pub const TTCRX_COUNTER_RESET_VALUE : u32 = 5;

/// The IAC id MSB register only takes these bits
pub const TTCRX_ID_MSB_MASK         : u32 = 0x3f;
/// Mode bits of the IAC id MSB register, set by hardware
pub const TTCRX_ID_MSB_MODE_MASK    : u32 = 0xc0;

/// Enable bit for hamming checking, present in 
/// CONFIG_2 and CONFIG_3
pub const TTCRX_HAMMING_ENABLE      : u32 = 0x02;

// control register bits
pub const CTRL_COUNTER_OPERATION    : u32 = 0x03; // [0] bunch counter, [1] event counter
pub const CTRL_SELECT_CLOCK_DES2    : u32 = 0x04;
pub const CTRL_ENABLE_CLOCK_DES2    : u32 = 0x08;
pub const CTRL_ENABLE_CLOCK_L1A     : u32 = 0x10;
pub const CTRL_ENABLE_PARALLEL_BUS  : u32 = 0x20;
pub const CTRL_ENABLE_SERIAL_B      : u32 = 0x40;
pub const CTRL_ENABLE_CLOCK40       : u32 = 0x80;

// status register bits
pub const STATUS_AUTO_RESET         : u8  = 0x10;
pub const STATUS_FRAME_SYNCH        : u8  = 0x20;
pub const STATUS_DLL_READY          : u8  = 0x40;
pub const STATUS_PLL_READY          : u8  = 0x80;

//========== ADM1025 Registers ==========
//
//=======================================

pub const ADM_MAX_ADDRESS           : u32 = 0x73;

pub const ADM_TEST                  : u32 = 0x15; // [0] offset select (1 - internal)
pub const ADM_TEMP_OFFSET           : u32 = 0x1f; // [7:0] two's complement

// live readings
pub const ADM_READ_2V5              : u32 = 0x20;
pub const ADM_READ_CORE             : u32 = 0x21;
pub const ADM_READ_3V3              : u32 = 0x22;
pub const ADM_READ_5V               : u32 = 0x23;
pub const ADM_READ_12V              : u32 = 0x24;
pub const ADM_READ_SUPPLY           : u32 = 0x25;
pub const ADM_READ_EXT_TEMP         : u32 = 0x26;
pub const ADM_READ_INT_TEMP         : u32 = 0x27;

// limits (high, low)
pub const ADM_2V5_HIGH              : u32 = 0x2b;
pub const ADM_2V5_LOW               : u32 = 0x2c;
pub const ADM_CORE_HIGH             : u32 = 0x2d;
pub const ADM_CORE_LOW              : u32 = 0x2e;
pub const ADM_3V3_HIGH              : u32 = 0x2f;
pub const ADM_3V3_LOW               : u32 = 0x30;
pub const ADM_5V_HIGH               : u32 = 0x31;
pub const ADM_5V_LOW                : u32 = 0x32;
pub const ADM_12V_HIGH              : u32 = 0x33;
pub const ADM_12V_LOW               : u32 = 0x34;
pub const ADM_SUPPLY_HIGH           : u32 = 0x35;
pub const ADM_SUPPLY_LOW            : u32 = 0x36;
pub const ADM_EXT_TEMP_HIGH         : u32 = 0x37;
pub const ADM_EXT_TEMP_LOW          : u32 = 0x38;
pub const ADM_INT_TEMP_HIGH         : u32 = 0x39;
pub const ADM_INT_TEMP_LOW          : u32 = 0x3a;

pub const ADM_MANUFACTURER_ID       : u32 = 0x3e;
pub const ADM_STEPPING_ID           : u32 = 0x3f;
pub const ADM_CONFIG                : u32 = 0x40; // [0] 1 - monitoring, 0 - stand-by
pub const ADM_STATUS_1              : u32 = 0x41;
pub const ADM_STATUS_2              : u32 = 0x42;
pub const ADM_VID                   : u32 = 0x47; // [7:6] offset select (11 - internal)

pub const ADM_TEST_OFFSET_SELECT    : u32 = 0x01;
pub const ADM_VID_OFFSET_SELECT     : u32 = 0xc0;
pub const ADM_CONFIG_START          : u32 = 0x01;

// status register 1 bits
pub const ADM_ST1_2V5               : u32 = 0x01;
pub const ADM_ST1_CORE              : u32 = 0x02;
pub const ADM_ST1_3V3               : u32 = 0x04;
pub const ADM_ST1_5V                : u32 = 0x08;
pub const ADM_ST1_INT_TEMP          : u32 = 0x10;
pub const ADM_ST1_EXT_TEMP          : u32 = 0x20;
// status register 2 bits
pub const ADM_ST2_12V               : u32 = 0x01;
pub const ADM_ST2_SUPPLY            : u32 = 0x02;
pub const ADM_ST2_DIODE_FAULT       : u32 = 0x40;

//========== FED system window ==========
//
//=======================================

pub const FED_MAX_ADDRESS           : u32 = 0xff;

pub const FED_CLOCK_SELECT          : u32 = 0x0c; // [1:0] 0 - internal, 1 - TTC, 2 - backplane
pub const FED_TTCRX_RESET           : u32 = 0x14; // write 1 (internal) or 2 (external) to pulse

pub const FED_CLOCK_INTERNAL        : u32 = 0;
pub const FED_CLOCK_TTC             : u32 = 1;
pub const FED_CLOCK_BACKPLANE       : u32 = 2;

pub const FED_TTCRX_RESET_INTERNAL  : u32 = 0x1;
pub const FED_TTCRX_RESET_EXTERNAL  : u32 = 0x2;
