// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interrupt vectors of the USART peripherals.
//!
//! avr-libc's startup code fills the vector table with weak `__vector_N`
//! symbols; the handlers below take their place. `__vector_N` is vector
//! number N + 1 in table 14-1 of the ATmega640/1280/1281/2560/2561
//! datasheet.

use crate::usart::{USART0, USART1, USART2, USART3};

macro_rules! usart_vectors {
    ($($rx:ident, $udre:ident => $port:ident;)*) => {
        $(
            #[no_mangle]
            pub unsafe extern "avr-interrupt" fn $rx() {
                $port.handle_receive_interrupt();
            }

            #[no_mangle]
            pub unsafe extern "avr-interrupt" fn $udre() {
                $port.handle_data_register_empty_interrupt();
            }
        )*
    };
}

usart_vectors! {
    __vector_25, __vector_26 => USART0;
    __vector_36, __vector_37 => USART1;
    __vector_51, __vector_52 => USART2;
    __vector_54, __vector_55 => USART3;
}
