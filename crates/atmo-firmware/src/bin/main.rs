#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use alloc::boxed::Box;

use atmo_core::{sampling::Sampler, sensors::bmp085::Bmp085};
use atmo_firmware::{
    config,
    mqtt::{self, MqttSession},
    net,
};
use embassy_executor::Spawner;
use embassy_net::{Ipv4Address, StackResources};
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use static_cell::StaticCell;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static STACK_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config_hal = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config_hal);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("Embassy initialized");

    // 1. Bring the radio up and hand the WiFi controller to its task.
    let radio_init = esp_radio::init().expect("Failed to initialize the radio controller");
    let radio_init: &'static _ = Box::leak(Box::new(radio_init));
    let (controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize the WiFi controller");

    // 2. Network stack over the station interface, DHCP for addressing.
    let mut rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner
        .spawn(net::connection_task(controller))
        .expect("Failed to spawn the WiFi connection task");
    spawner
        .spawn(net::net_task(runner))
        .expect("Failed to spawn the network stack task");

    net::wait_for_network(stack).await;

    // 3. The barometer on the I2C bus.
    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .expect("Failed to configure the I2C bus")
        .with_sda(peripherals.GPIO6)
        .with_scl(peripherals.GPIO7)
        .into_async();
    let barometer = Bmp085::new(i2c, embassy_time::Delay);

    // 4. MQTT session to the broker.
    let broker_address: Ipv4Address = config::MQTT_HOST
        .parse()
        .expect("MQTT_HOST must be an IPv4 address");
    let broker_port: u16 = config::MQTT_PORT
        .parse()
        .expect("MQTT_PORT must be a port number");

    let mut rx_buffer = [0u8; mqtt::SOCKET_BUFFER_SIZE];
    let mut tx_buffer = [0u8; mqtt::SOCKET_BUFFER_SIZE];
    let mut write_buffer = [0u8; mqtt::CLIENT_BUFFER_SIZE];
    let mut recv_buffer = [0u8; mqtt::CLIENT_BUFFER_SIZE];

    let session = MqttSession::connect(
        stack,
        (broker_address, broker_port),
        &mut rx_buffer,
        &mut tx_buffer,
        &mut write_buffer,
        &mut recv_buffer,
    )
    .await
    .expect("Failed to establish the MQTT session");

    // 5. Hand everything to the sampling loop. It returns only if the
    //    barometer is unusable; the node then stays up for debugging but
    //    never publishes.
    let halted = Sampler::new(barometer, session, embassy_time::Delay)
        .run()
        .await;
    error!("Sampling halted: {halted}");

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
