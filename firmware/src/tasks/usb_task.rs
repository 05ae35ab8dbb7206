/*
* USB Task
*  - CDC-ACM serial, one command session per host connection
*  - UsbSerial adapts the packet class to embedded-io-async byte streams
*/

use super::*;

use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use embedded_io_async::ErrorKind;
use servo_core::CommandProcessor;

use crate::resources::USB_PACKET_SIZE;

/* --------------------------- Error -------------------------- */
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum UsbError {
    Disabled,
    BufferOverflow,
}

impl From<EndpointError> for UsbError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Disabled => UsbError::Disabled,
            EndpointError::BufferOverflow => UsbError::BufferOverflow,
        }
    }
}

impl embedded_io_async::Error for UsbError {
    fn kind(&self) -> ErrorKind {
        match self {
            UsbError::Disabled => ErrorKind::NotConnected,
            UsbError::BufferOverflow => ErrorKind::OutOfMemory,
        }
    }
}

/* --------------------------- Serial Adapter -------------------------- */
pub struct UsbSerial<'d> {
    class: CdcAcmClass<'d, Driver<'d, USB>>,
    rx_buf: [u8; USB_PACKET_SIZE],
    rx_len: usize,
    rx_pos: usize,
    tx_buf: [u8; USB_PACKET_SIZE],
    tx_len: usize,
    needs_zlp: bool,
}

impl<'d> UsbSerial<'d> {
    pub fn new(class: CdcAcmClass<'d, Driver<'d, USB>>) -> Self {
        Self {
            class,
            rx_buf: [0u8; USB_PACKET_SIZE],
            rx_len: 0,
            rx_pos: 0,
            tx_buf: [0u8; USB_PACKET_SIZE],
            tx_len: 0,
            needs_zlp: false,
        }
    }

    pub async fn wait_connection(&mut self) {
        self.class.wait_connection().await;
        self.rx_len = 0;
        self.rx_pos = 0;
        self.tx_len = 0;
        self.needs_zlp = false;
    }

    async fn send_pending(&mut self) -> Result<(), UsbError> {
        let len = self.tx_len;
        self.tx_len = 0;
        self.class.write_packet(&self.tx_buf[..len]).await?;
        // A full packet does not end the transfer on the host side
        self.needs_zlp = len == USB_PACKET_SIZE;
        Ok(())
    }
}

impl embedded_io_async::ErrorType for UsbSerial<'_> {
    type Error = UsbError;
}

impl embedded_io_async::Read for UsbSerial<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, UsbError> {
        while self.rx_pos == self.rx_len {
            self.rx_len = self.class.read_packet(&mut self.rx_buf).await?;
            self.rx_pos = 0;
        }

        let n = (self.rx_len - self.rx_pos).min(buf.len());
        buf[..n].copy_from_slice(&self.rx_buf[self.rx_pos..self.rx_pos + n]);
        self.rx_pos += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for UsbSerial<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, UsbError> {
        if self.tx_len == USB_PACKET_SIZE {
            self.send_pending().await?;
        }

        let n = (USB_PACKET_SIZE - self.tx_len).min(buf.len());
        self.tx_buf[self.tx_len..self.tx_len + n].copy_from_slice(&buf[..n]);
        self.tx_len += n;
        Ok(n)
    }

    async fn flush(&mut self) -> Result<(), UsbError> {
        if self.tx_len > 0 {
            self.send_pending().await?;
        }
        if self.needs_zlp {
            self.class.write_packet(&[]).await?;
            self.needs_zlp = false;
        }
        Ok(())
    }
}

/* --------------------------- Tasks -------------------------- */
#[embassy_executor::task]
pub async fn usb_device_task(mut usb: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    usb.run().await;
}

#[embassy_executor::task]
pub async fn usb_communication_task(class: CdcAcmClass<'static, Driver<'static, USB>>) {
    let mut serial = UsbSerial::new(class);
    let mut processor = CommandProcessor::new(&SERVO, &ENCODER);

    loop {
        serial.wait_connection().await;
        let reason = processor.run(&mut serial).await;
        defmt::info!("USB session ended: {}", reason);
    }
}
