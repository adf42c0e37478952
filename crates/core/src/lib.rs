pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod bounding_box;
        pub mod detection;
        pub mod face_detector;
        pub mod face_landmarks;
        pub mod normalizer;
        pub mod raw_detection;
    }
    pub mod infrastructure;
}

pub mod classification {
    pub mod domain {
        pub mod classification_policy;
        pub mod validity_classifier;
        pub mod validity_label;
    }
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod video_reader;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod image_file_reader;
        pub mod image_file_writer;
    }
}

pub mod pipeline {
    pub mod detection_sink;
    pub mod frame_classification;
    pub mod infrastructure;
    pub mod pipeline_logger;
    pub mod validate_stream_use_case;
}
