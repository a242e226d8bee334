//! Face detection, feature sealing and matching.
//!
//! Each bounded context splits into `domain` (traits and value types) and
//! `infrastructure` (concrete implementations). [`pipeline::face_pipeline::FacePipeline`]
//! wires them together.

pub mod shared {
    pub mod bounding_box;
    pub mod config;
    pub mod constants;
    pub mod feature_vector;
    pub mod gray_frame;
}

pub mod imaging {
    pub mod domain {
        pub mod crop;
        pub mod image_reader;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_params;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod extraction {
    pub mod domain {
        pub mod feature_extractor;
    }
    pub mod infrastructure;
}

pub mod encryption {
    pub mod domain {
        pub mod encryption_key;
        pub mod key_provider;
        pub mod payload_cipher;
    }
    pub mod infrastructure;
}

pub mod matching {
    pub mod domain {
        pub mod cosine_matcher;
        pub mod match_outcome;
        pub mod sealed_comparison;
    }
}

pub mod pipeline {
    pub mod batch_scan;
    pub mod detection_result;
    pub mod face_pipeline;
}
